//! Vault client for interacting with deployed vaults.
//!
//! Uses alloy contract bindings from `crate::contracts` for reads and
//! properly ABI-encoded transaction data for writes.

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{Log, TransactionRequest};
use alloy::sol_types::SolCall;

use crate::chain::ChainClient;
use crate::contracts::IVault;
use crate::error::VaultError;

/// Encoded transaction data ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTransaction {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
}

/// Outcome of a successful `withdraw()`.
#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub amount: U256,
    /// Block timestamp recorded by the vault.
    pub when: U256,
    pub tx_hash: B256,
}

pub struct VaultClient<'a> {
    chain: &'a ChainClient,
    address: Address,
}

impl<'a> VaultClient<'a> {
    pub fn new(chain: &'a ChainClient, address: Address) -> Self {
        Self { chain, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `getOwner()`.
    pub async fn owner(&self) -> Result<Address, VaultError> {
        let vault = IVault::new(self.address, &self.chain.provider);
        vault
            .getOwner()
            .call()
            .await
            .map_err(|e| VaultError::Contract {
                method: "getOwner".into(),
                message: e.to_string(),
            })
    }

    /// Native balance held by the vault.
    pub async fn balance(&self) -> Result<U256, VaultError> {
        Ok(self.chain.provider.get_balance(self.address).await?)
    }

    /// Encode a withdraw call: `withdraw()`
    pub fn encode_withdraw(&self) -> EncodedTransaction {
        EncodedTransaction {
            to: self.address,
            data: IVault::withdrawCall {}.abi_encode(),
            value: U256::ZERO,
        }
    }

    /// Withdraw the vault's balance to its owner and wait for the receipt.
    ///
    /// Must be sent from the owner account; the vault reverts otherwise.
    pub async fn withdraw(&self) -> Result<WithdrawalReceipt, VaultError> {
        let encoded = self.encode_withdraw();
        let tx = TransactionRequest::default()
            .from(self.chain.default_account())
            .to(encoded.to)
            .input(Bytes::from(encoded.data).into())
            .value(encoded.value);

        let pending = self
            .chain
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| VaultError::Contract {
                method: "withdraw".into(),
                message: e.to_string(),
            })?;

        let tx_hash = *pending.tx_hash();

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| VaultError::Rpc(format!("withdraw receipt failed: {e}")))?;

        if !receipt.status() {
            return Err(VaultError::TransactionReverted {
                tx_hash: tx_hash.to_string(),
            });
        }

        let withdrawal = withdrawal_receipt(receipt.inner.logs(), self.address, tx_hash)?;

        tracing::info!(
            vault = %self.address,
            amount = %withdrawal.amount,
            tx = %tx_hash,
            "Withdrawal complete"
        );

        Ok(withdrawal)
    }
}

/// Decode the `Withdrawal(amount, when)` log emitted by `vault`.
fn withdrawal_in_logs(logs: &[Log], vault: Address) -> Option<(U256, U256)> {
    logs.iter()
        .filter(|log| log.address() == vault)
        .find_map(|log| log.log_decode::<IVault::Withdrawal>().ok())
        .map(|log| (log.inner.data.amount, log.inner.data.when))
}

/// Build the receipt of a mined withdrawal. A successful transaction without
/// a `Withdrawal` log means the vault does not speak the expected ABI.
fn withdrawal_receipt(
    logs: &[Log],
    vault: Address,
    tx_hash: B256,
) -> Result<WithdrawalReceipt, VaultError> {
    let (amount, when) =
        withdrawal_in_logs(logs, vault).ok_or_else(|| VaultError::Contract {
            method: "withdraw".into(),
            message: format!("no Withdrawal event from {vault} in transaction {tx_hash}"),
        })?;
    Ok(WithdrawalReceipt {
        amount,
        when,
        tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_encode_withdraw() {
        let chain = ChainClient::new("http://localhost:8545", TEST_KEY, 31337).unwrap();
        let vault = Address::with_last_byte(0x01);
        let client = VaultClient::new(&chain, vault);
        let tx = client.encode_withdraw();
        assert_eq!(tx.to, vault);
        assert_eq!(tx.data, keccak256(b"withdraw()")[..4].to_vec());
        assert_eq!(tx.value, U256::ZERO);
    }

    #[test]
    fn test_withdrawal_in_logs() {
        use alloy::primitives::Log as PrimitiveLog;
        use alloy::sol_types::SolEvent;

        let vault = Address::with_last_byte(0x01);
        let event = IVault::Withdrawal {
            amount: U256::from(1_000u64),
            when: U256::from(1_700_000_000u64),
        };
        let log = Log {
            inner: PrimitiveLog {
                address: vault,
                data: event.encode_log_data(),
            },
            ..Default::default()
        };

        assert_eq!(
            withdrawal_in_logs(std::slice::from_ref(&log), vault),
            Some((U256::from(1_000u64), U256::from(1_700_000_000u64)))
        );
        assert_eq!(
            withdrawal_in_logs(&[log], Address::with_last_byte(0x02)),
            None
        );
    }

    #[test]
    fn test_withdrawal_receipt_requires_event() {
        let vault = Address::with_last_byte(0x01);
        let tx_hash = B256::with_last_byte(0xAB);

        let err = withdrawal_receipt(&[], vault, tx_hash).unwrap_err();
        match err {
            VaultError::Contract { method, message } => {
                assert_eq!(method, "withdraw");
                assert!(message.contains("no Withdrawal event"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
