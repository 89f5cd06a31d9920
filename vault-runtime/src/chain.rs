//! Chain client for the target EVM network.
//!
//! Provides a configured provider whose wallet holds every configured
//! account. The first account is the default sender for transactions.

use alloy::network::{Ethereum, EthereumWallet, NetworkWallet};
use alloy::primitives::Address;
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy::providers::{Identity, Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;

use crate::accounts;
use crate::config::Config;
use crate::error::VaultError;

/// The concrete provider type produced by `ProviderBuilder::new().wallet(...).connect_http(...)`.
///
/// Fills nonce, gas and chain ID, and signs transactions with the supplied
/// wallet.
pub type HttpProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// A chain client wrapping an alloy provider with local signers.
pub struct ChainClient {
    pub provider: HttpProvider,
    pub wallet: EthereumWallet,
    pub chain_id: u64,
}

impl ChainClient {
    /// Create a new chain client from an RPC URL and hex-encoded private key.
    ///
    /// The private key should be a hex string (with or without "0x" prefix).
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self, VaultError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| VaultError::Config(format!("Invalid private key: {e}")))?;

        Self::from_signers(rpc_url, vec![signer], chain_id)
    }

    /// Create a chain client holding all `signers`. The first one sends
    /// transactions unless a call picks another account explicitly.
    pub fn from_signers(
        rpc_url: &str,
        signers: Vec<PrivateKeySigner>,
        chain_id: u64,
    ) -> Result<Self, VaultError> {
        let mut signers = signers.into_iter();
        let first = signers
            .next()
            .ok_or_else(|| VaultError::Config("At least one account is required".into()))?;

        let mut wallet = EthereumWallet::from(first);
        for signer in signers {
            wallet.register_signer(signer);
        }

        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| VaultError::Config(format!("Invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.clone())
            .connect_http(url);

        Ok(Self {
            provider,
            wallet,
            chain_id,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, VaultError> {
        let signers = accounts::signers(&config.accounts)?;
        tracing::debug!(
            network = %config.network,
            accounts = signers.len(),
            "Connecting chain client"
        );
        Self::from_signers(&config.rpc_url, signers, config.chain_id)
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// Default sender address.
    pub fn default_account(&self) -> Address {
        NetworkWallet::<Ethereum>::default_signer_address(&self.wallet)
    }

    /// All account addresses, default sender first.
    pub fn accounts(&self) -> Vec<Address> {
        let default = self.default_account();
        let mut addresses = vec![default];
        addresses.extend(
            NetworkWallet::<Ethereum>::signer_addresses(&self.wallet).filter(|a| *a != default),
        );
        addresses
    }

    /// Compare the RPC's chain ID with the configured one.
    ///
    /// Returns the remote chain ID; a mismatch is logged, not fatal, since
    /// forks and local nodes often report a different ID.
    pub async fn verify_chain_id(&self) -> Result<u64, VaultError> {
        let remote = self.provider.get_chain_id().await?;
        if remote != self.chain_id {
            tracing::warn!(
                configured = self.chain_id,
                remote,
                "RPC endpoint reports a different chain ID"
            );
        }
        Ok(remote)
    }
}
