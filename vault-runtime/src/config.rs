//! Deployment configuration.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, the
//! optional TOML config file, environment variables, then explicit overrides
//! from the caller.
//!
//! ```toml
//! network = "fuji"
//! artifacts_dir = "contracts/out"
//! create2_salt = "0x0000000000000000000000000000000000000000000000000000000000000001"
//!
//! [networks.fuji]
//! url = "https://api.avax-test.network/ext/bc/C/rpc"
//! factory = "0x0568846C86B727Ba76794fF1bFD0713384d879ab"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use alloy::primitives::{Address, B256, address, b256};
use serde::Deserialize;

use crate::create2::parse_salt;
use crate::error::VaultError;
use crate::network::Network;

/// Factory deployed on Fuji.
pub const DEFAULT_FACTORY_ADDRESS: Address =
    address!("0x0568846C86B727Ba76794fF1bFD0713384d879ab");

/// Owner passed to the `VaultFactory` constructor when deploying a new factory.
pub const DEFAULT_FACTORY_OWNER: Address = address!("0x9fEad8B19C044C2f404dac38B925Ea16ADaa2954");

/// Public Hardhat/Anvil test mnemonic. Never holds real funds.
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub const DEFAULT_CREATE2_SALT: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");

pub const DEFAULT_ACCOUNT_COUNT: u32 = 20;

pub const DEFAULT_ARTIFACTS_DIR: &str = "contracts/out";

pub const ENV_PROVIDER_URL: &str = "ETH_PROVIDER_URL";
pub const ENV_PRIVATE_KEY: &str = "ETH_PRIVATE_KEY";
pub const ENV_MNEMONIC: &str = "MNEMONIC";
pub const ENV_NETWORK: &str = "VAULT_NETWORK";
pub const ENV_FACTORY_ADDRESS: &str = "VAULT_FACTORY_ADDRESS";
pub const ENV_FACTORY_OWNER: &str = "VAULT_FACTORY_OWNER";
pub const ENV_CREATE2_SALT: &str = "VAULT_CREATE2_SALT";
pub const ENV_ARTIFACTS_DIR: &str = "VAULT_ARTIFACTS_DIR";

/// Where signing keys come from.
#[derive(Clone, PartialEq, Eq)]
pub enum AccountSource {
    PrivateKey(String),
    Mnemonic { phrase: String, count: u32 },
}

// Keys and phrases stay out of logs.
impl fmt::Debug for AccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSource::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            AccountSource::Mnemonic { phrase, count } if phrase == TEST_MNEMONIC => {
                write!(f, "Mnemonic(test mnemonic, {count} accounts)")
            }
            AccountSource::Mnemonic { count, .. } => {
                write!(f, "Mnemonic(<redacted>, {count} accounts)")
            }
        }
    }
}

/// Per-network section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkFileConfig {
    pub url: Option<String>,
    pub factory: Option<String>,
    pub chain_id: Option<u64>,
    pub accounts: Option<u32>,
}

/// On-disk TOML config. Secrets are deliberately not accepted here; they
/// come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub network: Option<String>,
    pub artifacts_dir: Option<PathBuf>,
    pub create2_salt: Option<String>,
    pub factory_owner: Option<String>,
    #[serde(default)]
    pub networks: HashMap<String, NetworkFileConfig>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, VaultError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Config(format!("Cannot read config file {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Fully resolved configuration for one network.
#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub rpc_url: String,
    pub chain_id: u64,
    pub accounts: AccountSource,
    pub factory: Address,
    pub factory_owner: Address,
    pub create2_salt: B256,
    pub artifacts_dir: PathBuf,
}

impl Config {
    /// Read the optional config file and the process environment, and
    /// resolve a config for `network` (or the configured default network).
    ///
    /// `.env` is not read here; binaries load it at startup.
    pub fn load(network: Option<Network>, config_path: Option<&Path>) -> Result<Self, VaultError> {
        let file = match config_path {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };

        Self::resolve(network, &file, |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Resolve a config from a parsed file and an environment lookup.
    pub fn resolve(
        network: Option<Network>,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, VaultError> {
        let network = match network {
            Some(n) => n,
            None => match env(ENV_NETWORK).or_else(|| file.network.clone()) {
                Some(name) => name.parse()?,
                None => Network::Fuji,
            },
        };

        let section = file.networks.get(network.name()).cloned().unwrap_or_default();

        let rpc_url = env(ENV_PROVIDER_URL)
            .or(section.url)
            .unwrap_or_else(|| network.default_rpc_url().to_string());
        url::Url::parse(&rpc_url)
            .map_err(|e| VaultError::Config(format!("Invalid RPC URL '{rpc_url}': {e}")))?;

        let count = section.accounts.unwrap_or(DEFAULT_ACCOUNT_COUNT);
        let accounts = match (env(ENV_PRIVATE_KEY), env(ENV_MNEMONIC)) {
            (Some(key), _) => AccountSource::PrivateKey(key),
            (None, Some(phrase)) => AccountSource::Mnemonic { phrase, count },
            (None, None) => AccountSource::Mnemonic {
                phrase: TEST_MNEMONIC.to_string(),
                count,
            },
        };

        let factory = match env(ENV_FACTORY_ADDRESS).or(section.factory) {
            Some(addr) => parse_address(&addr)?,
            None => DEFAULT_FACTORY_ADDRESS,
        };

        let factory_owner = match env(ENV_FACTORY_OWNER).or_else(|| file.factory_owner.clone()) {
            Some(addr) => parse_address(&addr)?,
            None => DEFAULT_FACTORY_OWNER,
        };

        let create2_salt = match env(ENV_CREATE2_SALT).or_else(|| file.create2_salt.clone()) {
            Some(salt) => parse_salt(&salt)?,
            None => DEFAULT_CREATE2_SALT,
        };

        let artifacts_dir = env(ENV_ARTIFACTS_DIR)
            .map(PathBuf::from)
            .or_else(|| file.artifacts_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        let config = Self {
            network,
            rpc_url,
            chain_id: section.chain_id.unwrap_or(network.chain_id()),
            accounts,
            factory,
            factory_owner,
            create2_salt,
            artifacts_dir,
        };

        tracing::debug!(?config, "Resolved configuration");
        Ok(config)
    }
}

/// Parse a hex address string into an alloy `Address`.
pub fn parse_address(input: &str) -> Result<Address, VaultError> {
    input
        .trim()
        .parse::<Address>()
        .map_err(|e| VaultError::InvalidAddress {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(None, &FileConfig::default(), env_from(&[])).unwrap();
        assert_eq!(config.network, Network::Fuji);
        assert_eq!(config.chain_id, 43113);
        assert_eq!(config.rpc_url, Network::Fuji.default_rpc_url());
        assert_eq!(config.factory, DEFAULT_FACTORY_ADDRESS);
        assert_eq!(config.factory_owner, DEFAULT_FACTORY_OWNER);
        assert_eq!(config.create2_salt, DEFAULT_CREATE2_SALT);
        assert_eq!(
            config.accounts,
            AccountSource::Mnemonic {
                phrase: TEST_MNEMONIC.into(),
                count: DEFAULT_ACCOUNT_COUNT
            }
        );
    }

    #[test]
    fn test_private_key_wins_over_mnemonic() {
        let env = env_from(&[
            (ENV_PRIVATE_KEY, "0xabc"),
            (ENV_MNEMONIC, "some other words"),
        ]);
        let config = Config::resolve(None, &FileConfig::default(), env).unwrap();
        assert_eq!(config.accounts, AccountSource::PrivateKey("0xabc".into()));
    }

    #[test]
    fn test_env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            network = "sepolia"

            [networks.sepolia]
            url = "http://file.example:8545"
            factory = "0x0000000000000000000000000000000000000001"
            accounts = 3
            "#,
        )
        .unwrap();

        let from_file = Config::resolve(None, &file, env_from(&[])).unwrap();
        assert_eq!(from_file.network, Network::Sepolia);
        assert_eq!(from_file.rpc_url, "http://file.example:8545");
        assert_eq!(from_file.factory, Address::with_last_byte(1));
        assert!(matches!(from_file.accounts, AccountSource::Mnemonic { count: 3, .. }));

        let env = env_from(&[
            (ENV_PROVIDER_URL, "http://env.example:8545"),
            (ENV_FACTORY_ADDRESS, "0x0000000000000000000000000000000000000002"),
        ]);
        let from_env = Config::resolve(None, &file, env).unwrap();
        assert_eq!(from_env.rpc_url, "http://env.example:8545");
        assert_eq!(from_env.factory, Address::with_last_byte(2));
    }

    #[test]
    fn test_explicit_network_wins() {
        let env = env_from(&[(ENV_NETWORK, "sepolia")]);
        let config =
            Config::resolve(Some(Network::Localhost), &FileConfig::default(), env).unwrap();
        assert_eq!(config.network, Network::Localhost);
        assert_eq!(config.chain_id, 31337);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_factory = env_from(&[(ENV_FACTORY_ADDRESS, "not-an-address")]);
        assert!(Config::resolve(None, &FileConfig::default(), bad_factory).is_err());

        let bad_url = env_from(&[(ENV_PROVIDER_URL, "not a url")]);
        assert!(Config::resolve(None, &FileConfig::default(), bad_url).is_err());

        let bad_network = env_from(&[(ENV_NETWORK, "mainnet")]);
        assert!(Config::resolve(None, &FileConfig::default(), bad_network).is_err());
    }

    #[test]
    fn test_salt_label_is_hashed() {
        let env = env_from(&[(ENV_CREATE2_SALT, "create2-example")]);
        let config = Config::resolve(None, &FileConfig::default(), env).unwrap();
        assert_eq!(
            config.create2_salt,
            alloy::primitives::keccak256(b"create2-example")
        );
    }

    #[test]
    fn test_file_config_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.toml");
        std::fs::write(
            &path,
            "artifacts_dir = \"build/out\"\n[networks.fuji]\nchain_id = 43113\n",
        )
        .unwrap();

        let file = FileConfig::from_path(&path).unwrap();
        assert_eq!(file.artifacts_dir, Some(PathBuf::from("build/out")));
        assert_eq!(file.networks["fuji"].chain_id, Some(43113));
    }

    #[test]
    fn test_file_config_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.toml");
        std::fs::write(&path, "private_key = \"0xabc\"\n").unwrap();
        assert!(FileConfig::from_path(&path).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = AccountSource::PrivateKey("0xsecret".into());
        assert!(!format!("{key:?}").contains("secret"));

        let phrase = AccountSource::Mnemonic {
            phrase: "very secret words".into(),
            count: 1,
        };
        assert!(!format!("{phrase:?}").contains("secret"));
    }
}
