//! Storage slot and storage word value types

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{LayoutError, LayoutResult};

/// A 256-bit storage location.
///
/// Displayed as `0x` followed by 64 lowercase hex digits. Parses from `0x`-prefixed
/// hex of any length up to 256 significant bits, or from a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageSlot(U256);

impl StorageSlot {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Canonical 32-byte big-endian form
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(bytes))
    }

    /// Build a slot from a big-endian buffer of any length.
    ///
    /// Leading zero bytes are ignored; anything left over 32 bytes is rejected.
    pub fn from_be_slice(bytes: &[u8]) -> LayoutResult<Self> {
        let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first_nonzero..];
        if significant.len() > 32 {
            return Err(LayoutError::invalid_slot(
                format!("0x{}", hex::encode(bytes)),
                format!("{} significant bytes exceed 256 bits", significant.len()),
            ));
        }
        let mut buf = [0u8; 32];
        buf[32 - significant.len()..].copy_from_slice(significant);
        Ok(Self::from_be_bytes(buf))
    }

    /// Add `delta` slots, wrapping modulo 2^256 like the EVM address space
    pub fn wrapping_add(self, delta: U256) -> Self {
        Self(self.0.wrapping_add(delta))
    }

    pub fn offset(self, slots: u64) -> Self {
        self.wrapping_add(U256::from(slots))
    }
}

impl From<U256> for StorageSlot {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<StorageSlot> for U256 {
    fn from(slot: StorageSlot) -> Self {
        slot.0
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}

impl FromStr for StorageSlot {
    type Err = LayoutError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LayoutError::invalid_slot(input, "empty input"));
        }

        if let Some(digits) = strip_hex_prefix(trimmed) {
            if digits.is_empty() {
                return Err(LayoutError::invalid_slot(trimmed, "no hex digits"));
            }
            let bytes = decode_hex_digits(digits)
                .map_err(|reason| LayoutError::invalid_slot(trimmed, reason))?;
            return Self::from_be_slice(&bytes)
                .map_err(|_| LayoutError::invalid_slot(trimmed, "exceeds 256 bits"));
        }

        U256::from_str_radix(trimmed, 10)
            .map(Self)
            .map_err(|e| LayoutError::invalid_slot(trimmed, e.to_string()))
    }
}

impl Serialize for StorageSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StorageSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Config files may write small slots as bare integers
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::from_u64(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a 32-byte storage word from hex, left-padding short input.
pub fn parse_word(input: &str) -> LayoutResult<B256> {
    let trimmed = input.trim();
    let digits = strip_hex_prefix(trimmed).unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(LayoutError::invalid_word(input, "empty input"));
    }
    let bytes = decode_hex_digits(digits).map_err(|reason| LayoutError::invalid_word(trimmed, reason))?;
    if bytes.len() > 32 {
        return Err(LayoutError::invalid_word(
            trimmed,
            format!("{} bytes exceed the 32-byte word size", bytes.len()),
        ));
    }
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(B256::from(buf))
}

pub(crate) fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

/// Decode hex digits, tolerating an odd digit count
pub(crate) fn decode_hex_digits(digits: &str) -> Result<Vec<u8>, String> {
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}")).map_err(|e| e.to_string())
    } else {
        hex::decode(digits).map_err(|e| e.to_string())
    }
}
