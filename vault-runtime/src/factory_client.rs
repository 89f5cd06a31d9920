//! Client for a deployed `VaultFactory`.
//!
//! Reads predicted addresses with `eth_call` and deploys vaults by sending
//! ABI-encoded factory calls through the `ChainClient`. Every deployment
//! waits for its receipt and then re-reads the address from the factory,
//! cross-checking it against the `VaultCreated` log.

use std::fmt;
use std::str::FromStr;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::{Log, TransactionReceipt, TransactionRequest};
use alloy::sol_types::{SolCall, SolError};
use alloy::transports::TransportError;

use crate::chain::ChainClient;
use crate::contracts::IVaultFactory;
use crate::error::VaultError;

/// Which deployment path of the factory a vault goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultKind {
    /// `deployVault` / `computeAddress`: salt is `keccak256(name)`.
    Legacy,
    /// `deployVaultWithNewSalt` / `computeVaultAddress`.
    Vault,
    /// `deployVaultUpgradeableBeacon` / `computeProxyAddress`.
    Proxy,
}

impl VaultKind {
    pub fn deploy_method(&self) -> &'static str {
        match self {
            VaultKind::Legacy => "deployVault",
            VaultKind::Vault => "deployVaultWithNewSalt",
            VaultKind::Proxy => "deployVaultUpgradeableBeacon",
        }
    }

    pub fn compute_method(&self) -> &'static str {
        match self {
            VaultKind::Legacy => "computeAddress",
            VaultKind::Vault => "computeVaultAddress",
            VaultKind::Proxy => "computeProxyAddress",
        }
    }

    /// ABI-encoded deployment call.
    pub fn encode_deploy(&self, name: &str, owner: Address) -> Vec<u8> {
        let name = name.to_string();
        match self {
            VaultKind::Legacy => IVaultFactory::deployVaultCall { name, owner }.abi_encode(),
            VaultKind::Vault => {
                IVaultFactory::deployVaultWithNewSaltCall { name, owner }.abi_encode()
            }
            VaultKind::Proxy => {
                IVaultFactory::deployVaultUpgradeableBeaconCall { name, owner }.abi_encode()
            }
        }
    }
}

impl fmt::Display for VaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VaultKind::Legacy => "legacy",
            VaultKind::Vault => "vault",
            VaultKind::Proxy => "proxy",
        })
    }
}

impl FromStr for VaultKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(VaultKind::Legacy),
            "vault" => Ok(VaultKind::Vault),
            "proxy" | "beacon" => Ok(VaultKind::Proxy),
            other => Err(VaultError::Config(format!("Unknown vault kind '{other}'"))),
        }
    }
}

/// Result of deploying a vault through the factory.
#[derive(Debug, Clone)]
pub struct VaultDeployment {
    pub name: String,
    pub kind: VaultKind,
    pub address: Address,
    /// Address reported by the `VaultCreated` log, if the factory emitted one.
    pub event_address: Option<Address>,
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// One `VaultCreated` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultCreatedEvent {
    pub vault: Address,
    pub block_number: Option<u64>,
    pub tx_hash: Option<B256>,
}

/// Widest block range requested in a single `eth_getLogs` call.
pub const LOG_QUERY_CHUNK: u64 = 2_048;

pub struct VaultFactoryClient<'a> {
    chain: &'a ChainClient,
    address: Address,
}

impl<'a> VaultFactoryClient<'a> {
    pub fn new(chain: &'a ChainClient, address: Address) -> Self {
        Self { chain, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn instance(&self) -> IVaultFactory::IVaultFactoryInstance<&'a crate::chain::HttpProvider> {
        IVaultFactory::new(self.address, &self.chain.provider)
    }

    /// Address the factory assigns to `name` under the legacy salt.
    pub async fn compute_address(&self, name: &str) -> Result<Address, VaultError> {
        self.predicted_address(VaultKind::Legacy, name).await
    }

    pub async fn compute_vault_address(&self, name: &str) -> Result<Address, VaultError> {
        self.predicted_address(VaultKind::Vault, name).await
    }

    pub async fn compute_proxy_address(&self, name: &str) -> Result<Address, VaultError> {
        self.predicted_address(VaultKind::Proxy, name).await
    }

    /// Ask the factory where the `kind` vault called `name` lives (or will).
    pub async fn predicted_address(
        &self,
        kind: VaultKind,
        name: &str,
    ) -> Result<Address, VaultError> {
        let factory = self.instance();
        let name_arg = name.to_string();
        let result = match kind {
            VaultKind::Legacy => factory.computeAddress(name_arg).call().await,
            VaultKind::Vault => factory.computeVaultAddress(name_arg).call().await,
            VaultKind::Proxy => factory.computeProxyAddress(name_arg).call().await,
        };

        let address = result.map_err(|e| VaultError::Contract {
            method: kind.compute_method().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(%kind, vault_name = name, %address, "Computed vault address");
        Ok(address)
    }

    /// Whether contract code exists at the `kind` address for `name`.
    pub async fn is_deployed(&self, kind: VaultKind, name: &str) -> Result<bool, VaultError> {
        let address = self.predicted_address(kind, name).await?;
        let code = self.chain.provider.get_code_at(address).await?;
        Ok(!code.is_empty())
    }

    /// `deployVault(name, owner)`.
    pub async fn deploy_vault(
        &self,
        name: &str,
        owner: Address,
    ) -> Result<VaultDeployment, VaultError> {
        self.deploy(VaultKind::Legacy, name, owner).await
    }

    /// `deployVaultWithNewSalt(name, owner)`.
    pub async fn deploy_vault_with_new_salt(
        &self,
        name: &str,
        owner: Address,
    ) -> Result<VaultDeployment, VaultError> {
        self.deploy(VaultKind::Vault, name, owner).await
    }

    /// `deployVaultUpgradeableBeacon(name, owner)`.
    pub async fn deploy_proxy(
        &self,
        name: &str,
        owner: Address,
    ) -> Result<VaultDeployment, VaultError> {
        self.deploy(VaultKind::Proxy, name, owner).await
    }

    /// Deploy a vault and wait for the receipt.
    ///
    /// Fails fast with `AlreadyDeployed` when code already sits at the
    /// predicted address, since the factory would revert with
    /// `Create2FailedDeployment()`.
    pub async fn deploy(
        &self,
        kind: VaultKind,
        name: &str,
        owner: Address,
    ) -> Result<VaultDeployment, VaultError> {
        let predicted = self.predicted_address(kind, name).await?;
        let code = self.chain.provider.get_code_at(predicted).await?;
        if !code.is_empty() {
            return Err(VaultError::AlreadyDeployed {
                name: name.to_string(),
                address: predicted.to_string(),
            });
        }

        tracing::info!(
            %kind,
            vault_name = name,
            %owner,
            %predicted,
            factory = %self.address,
            "Deploying vault"
        );

        let tx = TransactionRequest::default()
            .from(self.chain.default_account())
            .to(self.address)
            .input(Bytes::from(kind.encode_deploy(name, owner)).into());

        let pending = self
            .chain
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| send_error(kind.deploy_method(), name, e))?;

        let tx_hash = *pending.tx_hash();

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| VaultError::Rpc(format!("{} receipt failed: {e}", kind.deploy_method())))?;

        if !receipt.status() {
            return Err(VaultError::TransactionReverted {
                tx_hash: tx_hash.to_string(),
            });
        }

        let event_address = vault_created_in(&receipt, self.address);
        let address = self.predicted_address(kind, name).await?;

        if let Some(logged) = event_address {
            if logged != address {
                tracing::warn!(
                    %kind,
                    vault_name = name,
                    %logged,
                    %address,
                    "VaultCreated address differs from the factory's computed address"
                );
            }
        }

        tracing::info!(
            %kind,
            vault_name = name,
            %address,
            tx = %tx_hash,
            block = ?receipt.block_number,
            "Vault deployed"
        );

        Ok(VaultDeployment {
            name: name.to_string(),
            kind,
            address,
            event_address,
            tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// All `VaultCreated` logs emitted by the factory from `from_block` up to
    /// the latest block.
    ///
    /// Queries `eth_getLogs` at most [`LOG_QUERY_CHUNK`] blocks at a time.
    pub async fn vault_created_events(
        &self,
        from_block: u64,
    ) -> Result<Vec<VaultCreatedEvent>, VaultError> {
        let latest = self.chain.provider.get_block_number().await?;
        let mut events = Vec::new();
        let mut start = from_block;

        while start <= latest {
            let end = start.saturating_add(LOG_QUERY_CHUNK - 1).min(latest);
            tracing::debug!(from = start, to = end, "Querying VaultCreated logs");

            let chunk = self
                .instance()
                .VaultCreated_filter()
                .from_block(start)
                .to_block(end)
                .query()
                .await
                .map_err(|e| VaultError::Contract {
                    method: "VaultCreated".into(),
                    message: e.to_string(),
                })?;

            events.extend(chunk.into_iter().map(|(event, log)| VaultCreatedEvent {
                vault: event.vault,
                block_number: log.block_number,
                tx_hash: log.transaction_hash,
            }));
            start = end + 1;
        }

        Ok(events)
    }
}

/// Find the `VaultCreated` log emitted by `factory` in a receipt.
pub fn vault_created_in(receipt: &TransactionReceipt, factory: Address) -> Option<Address> {
    vault_created_in_logs(receipt.inner.logs(), factory)
}

fn vault_created_in_logs(logs: &[Log], factory: Address) -> Option<Address> {
    logs.iter()
        .filter(|log| log.address() == factory)
        .find_map(|log| log.log_decode::<IVaultFactory::VaultCreated>().ok())
        .map(|log| log.inner.data.vault)
}

/// Whether revert data is the factory's `Create2FailedDeployment()` error.
pub fn is_create2_failure(revert_data: &[u8]) -> bool {
    revert_data.starts_with(&IVaultFactory::Create2FailedDeployment::SELECTOR)
}

/// Map a failed `eth_sendTransaction` (usually a revert during gas
/// estimation) to a `VaultError`.
fn send_error(method: &str, name: &str, err: TransportError) -> VaultError {
    let revert = err.as_error_resp().and_then(|payload| payload.as_revert_data());
    match revert {
        Some(data) if is_create2_failure(&data) => VaultError::Create2FailedDeployment {
            name: name.to_string(),
        },
        _ => VaultError::Contract {
            method: method.to_string(),
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_create2_failure_selector() {
        let selector = &keccak256(b"Create2FailedDeployment()")[..4];
        assert!(is_create2_failure(selector));
        assert!(!is_create2_failure(&[0x08, 0xc3, 0x79, 0xa0]));
        assert!(!is_create2_failure(&[]));
    }

    fn revert_error(data: &str) -> TransportError {
        let payload = format!(r#"{{"code":3,"message":"execution reverted","data":"{data}"}}"#);
        TransportError::ErrorResp(serde_json::from_str(&payload).unwrap())
    }

    #[test]
    fn test_send_error_maps_create2_revert() {
        let data = format!(
            "0x{}",
            hex::encode(IVaultFactory::Create2FailedDeployment::SELECTOR)
        );
        match send_error("deployVault", "TtheBC01", revert_error(&data)) {
            VaultError::Create2FailedDeployment { name } => assert_eq!(name, "TtheBC01"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_send_error_keeps_other_reverts() {
        // Error(string) selector
        let err = send_error("deployVault", "TtheBC01", revert_error("0x08c379a0"));
        match err {
            VaultError::Contract { method, .. } => assert_eq!(method, "deployVault"),
            other => panic!("unexpected error {other:?}"),
        }

        let err = send_error(
            "deployVaultUpgradeableBeacon",
            "TtheBC01",
            TransportError::local_usage_str("connection refused"),
        );
        assert!(matches!(err, VaultError::Contract { .. }));
    }

    #[test]
    fn test_encode_deploy_selectors() {
        let owner = Address::with_last_byte(0x42);
        let legacy = VaultKind::Legacy.encode_deploy("TtheBC01", owner);
        let vault = VaultKind::Vault.encode_deploy("TtheBC01", owner);
        let proxy = VaultKind::Proxy.encode_deploy("TtheBC01", owner);

        assert_eq!(&legacy[..4], &keccak256(b"deployVault(string,address)")[..4]);
        assert_eq!(
            &vault[..4],
            &keccak256(b"deployVaultWithNewSalt(string,address)")[..4]
        );
        assert_eq!(
            &proxy[..4],
            &keccak256(b"deployVaultUpgradeableBeacon(string,address)")[..4]
        );
    }

    #[test]
    fn test_encode_deploy_round_trips_args() {
        let owner = Address::with_last_byte(0x42);
        let data = VaultKind::Legacy.encode_deploy("my-vault", owner);
        let decoded = IVaultFactory::deployVaultCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.name, "my-vault");
        assert_eq!(decoded.owner, owner);
    }

    #[test]
    fn test_vault_kind_parse() {
        assert_eq!("proxy".parse::<VaultKind>().unwrap(), VaultKind::Proxy);
        assert_eq!("Beacon".parse::<VaultKind>().unwrap(), VaultKind::Proxy);
        assert_eq!("legacy".parse::<VaultKind>().unwrap(), VaultKind::Legacy);
        assert!("clone".parse::<VaultKind>().is_err());
    }

    #[test]
    fn test_vault_created_in_logs() {
        use alloy::primitives::Log as PrimitiveLog;
        use alloy::sol_types::SolEvent;

        let factory = Address::with_last_byte(0xFA);
        let vault = Address::with_last_byte(0x01);
        let data = IVaultFactory::VaultCreated { vault }.encode_log_data();

        let log = |emitter: Address| Log {
            inner: PrimitiveLog {
                address: emitter,
                data: data.clone(),
            },
            ..Default::default()
        };

        assert_eq!(vault_created_in_logs(&[log(factory)], factory), Some(vault));
        // Logs from other contracts are ignored.
        assert_eq!(
            vault_created_in_logs(&[log(Address::with_last_byte(0xEE))], factory),
            None
        );
        assert_eq!(vault_created_in_logs(&[], factory), None);
    }
}
