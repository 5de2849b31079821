//! Keccak256 hashing

use anyhow::{anyhow, bail, Result};

use super::ToolResult;
use crate::domain::storage::SlotHasher;

/// Hash `0x` hex input as raw bytes, anything else as UTF-8 text
pub fn keccak(input: &str, hasher: &dyn SlotHasher) -> Result<ToolResult> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Usage: hash <data>");
    }

    let data = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(digits) => hex::decode(digits).map_err(|e| anyhow!("Invalid hex: {}", e))?,
        None => input.as_bytes().to_vec(),
    };

    let digest = hasher.hash(&data);
    Ok(ToolResult::new("Keccak256")
        .add("bytes", data.len().to_string())
        .add("hash", format!("0x{}", hex::encode(digest))))
}
