use std::path::PathBuf;

use alloy::primitives::{Address, B256};
use clap::{Parser, Subcommand};
use vault_runtime::{Network, VaultKind};

/// Deploy and inspect vaults created by the deterministic vault factory.
#[derive(Debug, Parser)]
#[command(name = "vault-tasks", version)]
pub struct Cli {
    /// Target network (fuji, sepolia, localhost). Defaults to `VAULT_NETWORK`
    /// or the config file, then fuji.
    #[arg(long, global = true)]
    pub network: Option<Network>,

    /// RPC endpoint, overriding `ETH_PROVIDER_URL` and the config file.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// VaultFactory address, overriding `VAULT_FACTORY_ADDRESS`.
    #[arg(long, global = true)]
    pub factory: Option<Address>,

    /// Path to a TOML config file.
    #[arg(long, global = true, env = "VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute a vault address offline from the factory address, the vault
    /// name and the vault init code.
    PredictAddress {
        #[arg(long)]
        name: String,
        /// keccak256 of the vault init code.
        #[arg(long, conflicts_with = "artifact")]
        init_code_hash: Option<B256>,
        /// Read init code from this contract's artifact instead.
        #[arg(long, default_value = "Vault")]
        artifact: String,
    },

    #[command(flatten)]
    Chain(ChainCommand),
}

/// Tasks that talk to the configured network.
#[derive(Debug, Subcommand)]
pub enum ChainCommand {
    /// Prints the configured accounts and their balances.
    Accounts,

    /// Prints the address of the proxy vault called NAME.
    GetProxyAddress {
        #[arg(long)]
        name: String,
    },

    /// Prints the address of the vault called NAME.
    GetVaultAddress {
        #[arg(long)]
        name: String,
        /// Use the legacy `computeAddress` salt.
        #[arg(long)]
        legacy: bool,
    },

    /// Deploy a new proxy vault.
    DeployProxy {
        #[arg(long)]
        name: String,
        /// Address that will own the proxy vault.
        #[arg(long)]
        owner: Address,
    },

    /// Deploy a new vault (no proxy).
    DeployVault {
        #[arg(long)]
        name: String,
        /// Address that will own the vault.
        #[arg(long)]
        owner: Address,
        /// Deploy through `deployVault` instead of `deployVaultWithNewSalt`.
        #[arg(long)]
        legacy: bool,
    },

    /// Prints the owner of the proxy vault called NAME.
    GetProxyOwner {
        #[arg(long)]
        name: String,
    },

    /// Prints the owner of the vault called NAME.
    GetVaultOwner {
        #[arg(long)]
        name: String,
        #[arg(long)]
        legacy: bool,
    },

    /// Withdraw a vault's balance to its owner. Must run as the owner.
    Withdraw {
        #[arg(long)]
        name: String,
        #[arg(long, conflicts_with = "legacy")]
        proxy: bool,
        #[arg(long)]
        legacy: bool,
    },

    /// Lists `VaultCreated` events emitted by the factory.
    Events {
        /// First block to scan. Defaults to the most recent 10000 blocks.
        #[arg(long)]
        from_block: Option<u64>,
    },

    /// Deploy a new VaultFactory.
    DeployFactory {
        /// Factory owner, overriding `VAULT_FACTORY_OWNER`.
        #[arg(long)]
        owner: Option<Address>,
        /// Deploy through the CREATE2 deployment proxy with the configured salt.
        #[arg(long)]
        deterministic: bool,
        /// Salt for a deterministic deployment: 32-byte hex or a label.
        #[arg(long, requires = "deterministic")]
        salt: Option<String>,
    },

    /// Deploy the Vault implementation through the CREATE2 deployment proxy.
    DeployImplementation {
        /// Salt: 32-byte hex or a label.
        #[arg(long, default_value = "create2-example")]
        salt: String,
    },
}

/// Which factory path a vault command refers to.
pub fn vault_kind(proxy: bool, legacy: bool) -> VaultKind {
    match (proxy, legacy) {
        (true, _) => VaultKind::Proxy,
        (false, true) => VaultKind::Legacy,
        (false, false) => VaultKind::Vault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy_vault() {
        let cli = Cli::try_parse_from([
            "vault-tasks",
            "--network",
            "sepolia",
            "deploy-vault",
            "--name",
            "TtheBC01",
            "--owner",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        ])
        .unwrap();

        assert_eq!(cli.network, Some(Network::Sepolia));
        match cli.command {
            Command::Chain(ChainCommand::DeployVault {
                name,
                owner,
                legacy,
            }) => {
                assert_eq!(name, "TtheBC01");
                assert_eq!(owner, address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
                assert!(!legacy);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_predict_address() {
        let cli = Cli::try_parse_from([
            "vault-tasks",
            "predict-address",
            "--name",
            "TtheBC01",
            "--artifact",
            "VaultV2",
        ])
        .unwrap();

        match cli.command {
            Command::PredictAddress {
                name,
                init_code_hash,
                artifact,
            } => {
                assert_eq!(name, "TtheBC01");
                assert_eq!(init_code_hash, None);
                assert_eq!(artifact, "VaultV2");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_code_hash_conflicts_with_artifact() {
        let hash = format!("0x{}", "11".repeat(32));
        let result = Cli::try_parse_from([
            "vault-tasks",
            "predict-address",
            "--name",
            "v",
            "--init-code-hash",
            hash.as_str(),
            "--artifact",
            "Vault",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_events_from_block_is_optional() {
        let cli = Cli::try_parse_from(["vault-tasks", "events"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Chain(ChainCommand::Events { from_block: None })
        ));

        let cli = Cli::try_parse_from(["vault-tasks", "events", "--from-block", "42"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Chain(ChainCommand::Events {
                from_block: Some(42)
            })
        ));
    }

    #[test]
    fn test_rejects_bad_owner() {
        let result = Cli::try_parse_from([
            "vault-tasks",
            "deploy-proxy",
            "--name",
            "v",
            "--owner",
            "nope",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_salt_requires_deterministic() {
        let result = Cli::try_parse_from(["vault-tasks", "deploy-factory", "--salt", "abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_vault_kind_flags() {
        assert_eq!(vault_kind(true, false), VaultKind::Proxy);
        assert_eq!(vault_kind(false, true), VaultKind::Legacy);
        assert_eq!(vault_kind(false, false), VaultKind::Vault);
    }
}
