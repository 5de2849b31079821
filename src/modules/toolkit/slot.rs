//! Storage slot calculation for Solidity

use alloy::primitives::{Address, U256};
use anyhow::{anyhow, bail, Result};

use super::ToolResult;
use crate::domain::storage::{
    array_base_slot, element_slot, mapping_slot as derive_mapping_slot, SlotHasher, StorageSlot,
};

/// `keccak256(slot) + index * stride` for a dynamic array
pub fn array_slot(
    slot_str: &str,
    index_str: Option<&str>,
    stride: u64,
    hasher: &dyn SlotHasher,
) -> Result<ToolResult> {
    let declared: StorageSlot = slot_str.parse()?;
    let base = array_base_slot(declared, hasher);

    let mut result = ToolResult::new("Array Slot")
        .add("declared_slot", declared.to_string())
        .add("base_slot", base.to_string());

    if let Some(index_str) = index_str {
        let index: i64 = index_str
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid index: {}", index_str))?;
        let slot = element_slot(base, index, stride)?;
        result = result
            .add("index", index.to_string())
            .add("stride", stride.to_string())
            .add("slot", slot.to_string())
            .add("slot_dec", slot.as_u256().to_string());
    }

    Ok(result)
}

/// `keccak256(pad32(key) ++ pad32(slot))` for a mapping entry
pub fn mapping_slot(slot_str: &str, key_str: &str, hasher: &dyn SlotHasher) -> Result<ToolResult> {
    let declared: StorageSlot = slot_str.parse()?;
    let key = mapping_key(key_str)?;
    let slot = derive_mapping_slot(key, declared, hasher);

    Ok(ToolResult::new("Mapping Slot")
        .add("declared_slot", declared.to_string())
        .add("key", format!("0x{}", hex::encode(key)))
        .add("slot", slot.to_string())
        .add("slot_dec", slot.as_u256().to_string()))
}

/// Encode a mapping key as its 32-byte ABI word.
///
/// `0x` + 40 hex digits is an address; other hex is left-padded bytes;
/// anything else is a decimal uint256.
pub fn mapping_key(key_str: &str) -> Result<[u8; 32]> {
    let key_str = key_str.trim();
    let mut buf = [0u8; 32];

    if let Some(digits) = key_str.strip_prefix("0x").or_else(|| key_str.strip_prefix("0X")) {
        if digits.len() == 40 {
            let addr: Address = format!("0x{digits}")
                .parse()
                .map_err(|e| anyhow!("Invalid address key: {}", e))?;
            buf[12..].copy_from_slice(addr.as_slice());
            return Ok(buf);
        }
        let bytes = hex::decode(digits).map_err(|e| anyhow!("Invalid hex key: {}", e))?;
        if bytes.len() > 32 {
            bail!("Key too large: {} bytes", bytes.len());
        }
        buf[32 - bytes.len()..].copy_from_slice(&bytes);
        return Ok(buf);
    }

    let value = U256::from_str_radix(key_str, 10).map_err(|_| anyhow!("Invalid key: {}", key_str))?;
    Ok(value.to_be_bytes::<32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::LayoutError;
    use crate::infrastructure::ethereum::Keccak256Hasher;

    #[test]
    fn test_array_slot_with_index() {
        let result = array_slot("0", Some("3"), 2, &Keccak256Hasher).unwrap();
        assert_eq!(
            result.get("base_slot"),
            Some("0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
        assert_eq!(
            result.get("slot"),
            Some("0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e569")
        );
    }

    #[test]
    fn test_array_slot_without_index() {
        let result = array_slot("0x1", None, 1, &Keccak256Hasher).unwrap();
        assert!(result.get("slot").is_none());
        assert_eq!(
            result.get("base_slot"),
            Some("0xb10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
        );
    }

    #[test]
    fn test_array_slot_errors() {
        let err = array_slot("0", Some("-1"), 2, &Keccak256Hasher).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LayoutError>(),
            Some(&LayoutError::IndexOutOfRange { index: -1 })
        );

        let err = array_slot(&format!("0x1{}", "0".repeat(64)), None, 1, &Keccak256Hasher).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LayoutError>(),
            Some(LayoutError::InvalidSlotInput { .. })
        ));
    }

    #[test]
    fn test_mapping_key_forms() {
        let addr = mapping_key("0x1234567890123456789012345678901234567890").unwrap();
        assert_eq!(&addr[..12], &[0u8; 12]);
        assert_eq!(addr[12], 0x12);

        let num = mapping_key("1").unwrap();
        let hex_num = mapping_key("0x01").unwrap();
        assert_eq!(num, hex_num);
        assert_eq!(num[31], 1);

        let upper = mapping_key("0X1234567890123456789012345678901234567890").unwrap();
        assert_eq!(upper, addr);
        assert_eq!(mapping_key("0X01").unwrap(), hex_num);

        assert!(mapping_key("0xzz").is_err());
        assert!(mapping_key(&format!("0x{}", "ab".repeat(33))).is_err());
        assert!(mapping_key("not-a-key").is_err());
    }

    #[test]
    fn test_mapping_slot_known_vector() {
        let result = mapping_slot("0", "1", &Keccak256Hasher).unwrap();
        assert_eq!(
            result.get("slot"),
            Some("0xada5013122d395ba3c54772283fb069b10426056ef8ca54750cb9bb552a59e7d")
        );
    }
}
