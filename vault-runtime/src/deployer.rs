//! Contract deployment from compiled artifacts.
//!
//! `VaultFactory(owner)` and the `Vault` implementation can be deployed
//! with plain CREATE or deterministically through the canonical CREATE2
//! deployment proxy, so the same salt and bytecode land at the same
//! address on every network.

use std::path::Path;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, Bytes, TxKind};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolValue;

use crate::artifact;
use crate::chain::ChainClient;
use crate::create2::{DETERMINISTIC_DEPLOYER, compute_create2_address, init_code_hash};
use crate::error::VaultError;

pub const VAULT_FACTORY_CONTRACT: &str = "VaultFactory";
pub const VAULT_CONTRACT: &str = "Vault";

/// A deployed (or already present) contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeployment {
    pub address: Address,
    /// `None` when the contract already existed and nothing was sent.
    pub tx_hash: Option<B256>,
}

/// `VaultFactory` init code: creation bytecode followed by the ABI-encoded
/// `owner` constructor argument.
pub fn factory_init_code(bytecode: &[u8], owner: Address) -> Vec<u8> {
    let mut init_code = bytecode.to_vec();
    init_code.extend_from_slice(&SolValue::abi_encode(&(owner,)));
    init_code
}

/// Address a deterministic deployment of `init_code` under `salt` lands at.
pub fn predict_deterministic(salt: B256, init_code: &[u8]) -> Address {
    compute_create2_address(DETERMINISTIC_DEPLOYER, salt, init_code_hash(init_code))
}

/// Deploy `init_code` with a plain CREATE transaction.
pub async fn deploy_create(
    chain: &ChainClient,
    init_code: Vec<u8>,
) -> Result<ContractDeployment, VaultError> {
    let mut tx = TransactionRequest::default()
        .from(chain.default_account())
        .input(TransactionInput::both(Bytes::from(init_code)));
    tx.to = Some(TxKind::Create);

    let pending = chain
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| VaultError::Rpc(format!("Deploy tx send failed: {e}")))?;
    let tx_hash = *pending.tx_hash();

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| VaultError::Rpc(format!("Deploy tx receipt failed: {e}")))?;

    if !receipt.status() {
        return Err(VaultError::TransactionReverted {
            tx_hash: tx_hash.to_string(),
        });
    }

    let address = receipt
        .contract_address
        .ok_or_else(|| VaultError::Rpc(format!("No contract address in receipt {tx_hash}")))?;

    tracing::info!(%address, tx = %tx_hash, "Contract deployed (CREATE)");
    Ok(ContractDeployment {
        address,
        tx_hash: Some(tx_hash),
    })
}

/// Deploy `init_code` through the CREATE2 deployment proxy.
///
/// Re-running with the same salt and code is a no-op that returns the
/// existing address.
pub async fn deploy_deterministic(
    chain: &ChainClient,
    salt: B256,
    init_code: Vec<u8>,
) -> Result<ContractDeployment, VaultError> {
    let deployer_code = chain.provider.get_code_at(DETERMINISTIC_DEPLOYER).await?;
    if deployer_code.is_empty() {
        return Err(VaultError::NoCode(format!(
            "{DETERMINISTIC_DEPLOYER} (CREATE2 deployment proxy)"
        )));
    }

    let predicted = predict_deterministic(salt, &init_code);
    if !chain.provider.get_code_at(predicted).await?.is_empty() {
        tracing::info!(address = %predicted, "Contract already deployed, skipping");
        return Ok(ContractDeployment {
            address: predicted,
            tx_hash: None,
        });
    }

    let mut calldata = salt.to_vec();
    calldata.extend_from_slice(&init_code);

    let tx = TransactionRequest::default()
        .from(chain.default_account())
        .to(DETERMINISTIC_DEPLOYER)
        .input(Bytes::from(calldata).into());

    let pending = chain
        .provider
        .send_transaction(tx)
        .await
        .map_err(|e| VaultError::Rpc(format!("CREATE2 deploy tx send failed: {e}")))?;
    let tx_hash = *pending.tx_hash();

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| VaultError::Rpc(format!("CREATE2 deploy tx receipt failed: {e}")))?;

    if !receipt.status() {
        return Err(VaultError::TransactionReverted {
            tx_hash: tx_hash.to_string(),
        });
    }

    if chain.provider.get_code_at(predicted).await?.is_empty() {
        return Err(VaultError::NoCode(predicted.to_string()));
    }

    tracing::info!(address = %predicted, tx = %tx_hash, %salt, "Contract deployed (CREATE2)");
    Ok(ContractDeployment {
        address: predicted,
        tx_hash: Some(tx_hash),
    })
}

/// Deploy `VaultFactory(owner)`. With a salt the deployment is
/// deterministic, otherwise it uses CREATE.
pub async fn deploy_factory(
    chain: &ChainClient,
    artifacts_dir: &Path,
    owner: Address,
    salt: Option<B256>,
) -> Result<ContractDeployment, VaultError> {
    let bytecode = artifact::load_bytecode(artifacts_dir, VAULT_FACTORY_CONTRACT)?;
    let init_code = factory_init_code(&bytecode, owner);

    tracing::info!(%owner, deterministic = salt.is_some(), "Deploying VaultFactory");
    match salt {
        Some(salt) => deploy_deterministic(chain, salt, init_code).await,
        None => deploy_create(chain, init_code).await,
    }
}

/// Deploy a standalone `Vault` implementation at a deterministic address.
pub async fn deploy_vault_implementation(
    chain: &ChainClient,
    artifacts_dir: &Path,
    salt: B256,
) -> Result<ContractDeployment, VaultError> {
    let bytecode = artifact::load_bytecode(artifacts_dir, VAULT_CONTRACT)?;
    tracing::info!(%salt, "Deploying Vault implementation");
    deploy_deterministic(chain, salt, bytecode).await
}
