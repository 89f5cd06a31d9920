//! Target networks and their defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Avalanche Fuji C-Chain testnet.
    Fuji,
    Sepolia,
    /// Local Anvil / Hardhat node.
    Localhost,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Fuji => 43113,
            Network::Sepolia => 11155111,
            Network::Localhost => 31337,
        }
    }

    /// Public RPC endpoint used when neither the config file nor
    /// `ETH_PROVIDER_URL` sets one.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Fuji => "https://api.avax-test.network/ext/bc/C/rpc",
            Network::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
            Network::Localhost => "http://127.0.0.1:8545",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Fuji => "fuji",
            Network::Sepolia => "sepolia",
            Network::Localhost => "localhost",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fuji" | "avalanche-fuji" => Ok(Network::Fuji),
            "sepolia" => Ok(Network::Sepolia),
            "localhost" | "local" | "anvil" | "hardhat" => Ok(Network::Localhost),
            other => Err(VaultError::Config(format!("Unknown network '{other}'"))),
        }
    }
}
