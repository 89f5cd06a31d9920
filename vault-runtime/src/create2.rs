//! CREATE2 address prediction.
//!
//! `address = keccak256(0xff ++ deployer ++ salt ++ keccak256(init_code))[12..]`
//!
//! The vault factory derives the salt for a vault from its name as
//! `keccak256(name)`, so a vault's address is known before it is deployed.

use alloy::primitives::{Address, B256, address, keccak256};

use crate::error::VaultError;

/// Canonical deterministic deployment proxy (Arachnid). Accepts
/// `salt ++ init_code` as raw calldata and CREATE2s the contract.
pub const DETERMINISTIC_DEPLOYER: Address = address!("0x4e59b44847b379578588920cA78FbF26c0B4956C");

/// Salt the factory uses for a vault name.
pub fn salt_for_name(name: &str) -> B256 {
    keccak256(name.as_bytes())
}

pub fn init_code_hash(init_code: &[u8]) -> B256 {
    keccak256(init_code)
}

/// Compute the CREATE2 address for `deployer`, `salt` and the hash of the
/// init code.
pub fn compute_create2_address(deployer: Address, salt: B256, init_code_hash: B256) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(deployer.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..85].copy_from_slice(init_code_hash.as_slice());

    Address::from_slice(&keccak256(preimage)[12..])
}

/// Predict where `factory` will place the vault called `name`.
pub fn predict_vault_address(factory: Address, name: &str, vault_init_code: &[u8]) -> Address {
    compute_create2_address(factory, salt_for_name(name), init_code_hash(vault_init_code))
}

/// Parse a deployment salt.
///
/// A `0x`-prefixed 32-byte hex string is taken verbatim. Anything else is
/// treated as a label and hashed, so `"create2-example"` is a valid salt.
pub fn parse_salt(input: &str) -> Result<B256, VaultError> {
    match input.strip_prefix("0x") {
        Some(hex_part) => {
            let bytes = hex::decode(hex_part)
                .map_err(|e| VaultError::Config(format!("Invalid salt hex '{input}': {e}")))?;
            if bytes.len() != 32 {
                return Err(VaultError::Config(format!(
                    "Salt must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
            Ok(B256::from_slice(&bytes))
        }
        None if input.is_empty() => Err(VaultError::Config("Salt must not be empty".into())),
        None => Ok(keccak256(input.as_bytes())),
    }
}
