use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {method}: {message}")]
    Contract { method: String, message: String },

    #[error("CREATE2 deployment failed for '{name}' (Create2FailedDeployment)")]
    Create2FailedDeployment { name: String },

    #[error("Vault '{name}' is already deployed at {address}")]
    AlreadyDeployed { name: String, address: String },

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    #[error("No contract code at {0}")]
    NoCode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(e: toml::de::Error) -> Self {
        VaultError::Config(format!("Invalid config file: {e}"))
    }
}

impl From<alloy::transports::TransportError> for VaultError {
    fn from(e: alloy::transports::TransportError) -> Self {
        VaultError::Rpc(e.to_string())
    }
}
