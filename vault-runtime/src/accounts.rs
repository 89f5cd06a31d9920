//! Signer derivation and account balance listing.

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::signers::local::coins_bip39::English;
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};

use crate::config::AccountSource;
use crate::error::VaultError;

/// BIP-44 Ethereum path prefix; the account index is appended.
pub const DERIVATION_PATH: &str = "m/44'/60'/0'/0/";

/// Build every signer described by `source`, in index order.
pub fn signers(source: &AccountSource) -> Result<Vec<PrivateKeySigner>, VaultError> {
    match source {
        AccountSource::PrivateKey(key) => {
            let signer: PrivateKeySigner = key
                .trim()
                .parse()
                .map_err(|e| VaultError::Config(format!("Invalid private key: {e}")))?;
            Ok(vec![signer])
        }
        AccountSource::Mnemonic { phrase, count } => {
            if *count == 0 {
                return Err(VaultError::Config("Account count must be at least 1".into()));
            }
            let builder = MnemonicBuilder::<English>::default().phrase(phrase.as_str());
            (0..*count)
                .map(|idx| {
                    builder
                        .clone()
                        .derivation_path(format!("{DERIVATION_PATH}{idx}"))
                        .and_then(|b| b.build())
                        .map_err(|e| {
                            VaultError::Config(format!("Cannot derive account {idx}: {e}"))
                        })
                })
                .collect()
        }
    }
}

/// Native balance of a configured account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: Address,
    pub balance: U256,
}

impl AccountBalance {
    /// Balance in ether, e.g. `"10000.000000000000000000"`.
    pub fn balance_ether(&self) -> String {
        alloy::primitives::utils::format_ether(self.balance)
    }
}

/// Fetch the native balance of every address.
pub async fn list_balances(
    provider: &impl Provider,
    addresses: &[Address],
) -> Result<Vec<AccountBalance>, VaultError> {
    let mut balances = Vec::with_capacity(addresses.len());
    for &address in addresses {
        let balance = provider.get_balance(address).await?;
        tracing::debug!(%address, %balance, "Fetched balance");
        balances.push(AccountBalance { address, balance });
    }
    Ok(balances)
}
