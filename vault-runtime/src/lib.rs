pub mod accounts;
pub mod artifact;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod create2;
pub mod deployer;
pub mod error;
pub mod factory_client;
pub mod network;
pub mod vault_client;

pub use chain::ChainClient;
pub use config::Config;
pub use error::VaultError;
pub use factory_client::{VaultDeployment, VaultFactoryClient, VaultKind};
pub use network::Network;
pub use vault_client::VaultClient;
