//! Field extraction from raw storage words

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::error::{LayoutError, LayoutResult};
use super::layout::{FieldKind, FieldLayout};

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Lowercase, no checksum casing
            DecodedValue::Address(addr) => write!(f, "0x{}", hex::encode(addr.as_slice())),
            DecodedValue::Uint(value) => write!(f, "{}", value),
            DecodedValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Bool(value) => serializer.serialize_bool(*value),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Decoded struct, one entry per layout field in layout order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedStruct {
    fields: Vec<(String, DecodedValue)>,
}

impl DecodedStruct {
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DecodedStruct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decode every field of `layout` from consecutive slot words.
///
/// `slot_values[i]` must hold the word at struct slot `i`, all read at the same
/// block height.
pub fn decode_fields(slot_values: &[B256], layout: &FieldLayout) -> LayoutResult<DecodedStruct> {
    let mut fields = Vec::with_capacity(layout.fields().len());

    for spec in layout.fields() {
        let word = slot_values
            .get(spec.slot_offset)
            .ok_or_else(|| LayoutError::SlotIndexOutOfRange {
                field: spec.name.clone(),
                slot_offset: spec.slot_offset,
                available: slot_values.len(),
            })?;

        let bytes = &word.as_slice()[spec.byte_range()];
        let value = match spec.kind {
            FieldKind::Address => DecodedValue::Address(Address::from_slice(bytes)),
            FieldKind::Uint => DecodedValue::Uint(U256::from_be_slice(bytes)),
            FieldKind::Bool => DecodedValue::Bool(bytes[0] != 0),
        };
        fields.push((spec.name.clone(), value));
    }

    Ok(DecodedStruct { fields })
}
