//! Compiled contract artifacts.
//!
//! Reads creation bytecode from Foundry (`<dir>/<Name>.sol/<Name>.json`,
//! `bytecode.object`) or Hardhat (`<dir>/<Name>.sol/<Name>.json`,
//! `bytecode` as a string) output.

use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Locate the artifact for `contract_name` under `dir`.
///
/// Tries `<Name>.sol/<Name>.json` first, then the Hardhat layout
/// `contracts/<Name>.sol/<Name>.json`, then a bare `<Name>.json`.
pub fn artifact_path(dir: &Path, contract_name: &str) -> Result<PathBuf, VaultError> {
    let file = format!("{contract_name}.json");
    let candidates = [
        dir.join(format!("{contract_name}.sol")).join(&file),
        dir.join("contracts")
            .join(format!("{contract_name}.sol"))
            .join(&file),
        dir.join(&file),
    ];

    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| {
            VaultError::Artifact(format!(
                "Cannot find artifact for {contract_name} in {}. Compile the contracts first.",
                dir.display()
            ))
        })
}

/// Read creation bytecode for `contract_name` from the artifacts directory.
pub fn load_bytecode(dir: &Path, contract_name: &str) -> Result<Vec<u8>, VaultError> {
    let path = artifact_path(dir, contract_name)?;
    let content = std::fs::read_to_string(&path)?;
    let bytecode = bytecode_from_json(&content).map_err(|e| match e {
        VaultError::Artifact(msg) => VaultError::Artifact(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    tracing::debug!(
        contract = contract_name,
        path = %path.display(),
        size = bytecode.len(),
        "Loaded artifact"
    );
    Ok(bytecode)
}

/// Extract creation bytecode from artifact JSON.
pub fn bytecode_from_json(content: &str) -> Result<Vec<u8>, VaultError> {
    let json: serde_json::Value = serde_json::from_str(content)?;

    let hex_str = json["bytecode"]["object"]
        .as_str()
        .or_else(|| json["bytecode"].as_str())
        .ok_or_else(|| VaultError::Artifact("bytecode missing".into()))?;

    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if stripped.contains("__$") {
        return Err(VaultError::Artifact(
            "bytecode has unlinked library placeholders".into(),
        ));
    }

    let bytes = hex::decode(stripped)
        .map_err(|e| VaultError::Artifact(format!("invalid bytecode hex: {e}")))?;
    if bytes.is_empty() {
        return Err(VaultError::Artifact(
            "bytecode is empty (abstract contract or interface?)".into(),
        ));
    }
    Ok(bytes)
}
