//! Declarative packed-struct layouts

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::{LayoutError, LayoutResult};

/// Width of one storage slot in bytes
pub const SLOT_BYTES: usize = 32;

/// Width of an address field in bytes
pub const ADDRESS_BYTES: usize = 20;

/// Largest number of consecutive slots one struct layout may span
pub const MAX_STRUCT_SLOTS: usize = 256;

/// How the bytes of a field are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Address,
    Uint,
    Bool,
}

/// One field of a packed struct.
///
/// `byte_offset` counts from the most significant byte of the big-endian slot
/// word, so a Solidity `address` packed at the low end of a slot sits at
/// `byte_offset = 12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub slot_offset: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        slot_offset: usize,
        byte_offset: usize,
        byte_length: usize,
    ) -> Self {
        Self {
            name: name.into(),
            slot_offset,
            byte_offset,
            byte_length,
            kind,
        }
    }

    /// Byte range `[start, end)` within the slot word
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset.saturating_add(self.byte_length)
    }

    fn validate(&self) -> LayoutResult<()> {
        if self.byte_length == 0 {
            return Err(LayoutError::ZeroWidthField {
                field: self.name.clone(),
            });
        }
        if self.slot_offset >= MAX_STRUCT_SLOTS {
            return Err(LayoutError::SlotOffsetTooLarge {
                field: self.name.clone(),
                slot_offset: self.slot_offset,
                max: MAX_STRUCT_SLOTS,
            });
        }
        let end = self.byte_range().end;
        if end > SLOT_BYTES {
            return Err(LayoutError::ByteRangeOverflow {
                field: self.name.clone(),
                start: self.byte_offset,
                end,
            });
        }
        match self.kind {
            FieldKind::Bool if self.byte_length != 1 => Err(LayoutError::InvalidBoolEncoding {
                field: self.name.clone(),
                width: self.byte_length,
            }),
            FieldKind::Address if self.byte_length != ADDRESS_BYTES => {
                Err(LayoutError::InvalidAddressWidth {
                    field: self.name.clone(),
                    width: self.byte_length,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A validated description of how one struct is packed across consecutive slots.
///
/// Only constructible through [`FieldLayout::new`] or the builder, both of which
/// validate once, so decoding never re-checks byte windows or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    name: String,
    fields: Vec<FieldSpec>,
    slot_count: usize,
}

impl FieldLayout {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> LayoutResult<Self> {
        let name = name.into();
        if fields.is_empty() {
            return Err(LayoutError::EmptyLayout { layout: name });
        }

        let mut names = BTreeSet::new();
        for field in &fields {
            field.validate()?;
            if !names.insert(field.name.as_str()) {
                return Err(LayoutError::DuplicateField {
                    field: field.name.clone(),
                });
            }
        }

        check_overlaps(&fields)?;

        let slot_count = fields
            .iter()
            .map(|f| f.slot_offset + 1)
            .max()
            .unwrap_or(1);

        Ok(Self {
            name,
            fields,
            slot_count,
        })
    }

    pub fn builder(name: impl Into<String>) -> FieldLayoutBuilder {
        FieldLayoutBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of consecutive slots the struct occupies
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

fn check_overlaps(fields: &[FieldSpec]) -> LayoutResult<()> {
    let mut sorted: Vec<&FieldSpec> = fields.iter().collect();
    sorted.sort_by_key(|f| (f.slot_offset, f.byte_offset));

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.slot_offset == b.slot_offset && b.byte_offset < a.byte_range().end {
            return Err(LayoutError::OverlappingFields {
                first: a.name.clone(),
                second: b.name.clone(),
                slot_offset: a.slot_offset,
            });
        }
    }
    Ok(())
}

/// Builder for [`FieldLayout`]
#[derive(Debug, Clone)]
pub struct FieldLayoutBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl FieldLayoutBuilder {
    /// 20-byte address at `byte_offset` in slot `slot_offset`
    pub fn address(mut self, name: impl Into<String>, slot_offset: usize, byte_offset: usize) -> Self {
        self.fields.push(FieldSpec::new(
            name,
            FieldKind::Address,
            slot_offset,
            byte_offset,
            ADDRESS_BYTES,
        ));
        self
    }

    pub fn uint(
        mut self,
        name: impl Into<String>,
        slot_offset: usize,
        byte_offset: usize,
        byte_length: usize,
    ) -> Self {
        self.fields.push(FieldSpec::new(
            name,
            FieldKind::Uint,
            slot_offset,
            byte_offset,
            byte_length,
        ));
        self
    }

    pub fn bool(mut self, name: impl Into<String>, slot_offset: usize, byte_offset: usize) -> Self {
        self.fields
            .push(FieldSpec::new(name, FieldKind::Bool, slot_offset, byte_offset, 1));
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn build(self) -> LayoutResult<FieldLayout> {
        FieldLayout::new(self.name, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_count_from_highest_offset() {
        let layout = FieldLayout::builder("Pair")
            .uint("a", 0, 0, 32)
            .bool("flag", 2, 31)
            .build()
            .unwrap();
        assert_eq!(layout.slot_count(), 3);
        assert_eq!(layout.field_names().collect::<Vec<_>>(), vec!["a", "flag"]);
    }

    #[test]
    fn test_rejects_window_past_slot_end() {
        let err = FieldLayout::builder("Bad")
            .uint("x", 0, 30, 4)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::ByteRangeOverflow {
                field: "x".into(),
                start: 30,
                end: 34
            }
        );
    }

    #[test]
    fn test_huge_byte_offset_is_a_range_error() {
        let err = FieldLayout::new(
            "X",
            vec![FieldSpec::new("x", FieldKind::Uint, 0, usize::MAX, 1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            LayoutError::ByteRangeOverflow {
                field: "x".into(),
                start: usize::MAX,
                end: usize::MAX
            }
        );
    }

    #[test]
    fn test_rejects_slot_offset_past_cap() {
        for slot_offset in [MAX_STRUCT_SLOTS, 1 << 58, usize::MAX] {
            let err = FieldLayout::builder("Far")
                .uint("x", slot_offset, 0, 32)
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                LayoutError::SlotOffsetTooLarge {
                    field: "x".into(),
                    slot_offset,
                    max: MAX_STRUCT_SLOTS
                }
            );
        }

        let layout = FieldLayout::builder("Edge")
            .uint("x", MAX_STRUCT_SLOTS - 1, 0, 32)
            .build()
            .unwrap();
        assert_eq!(layout.slot_count(), MAX_STRUCT_SLOTS);
    }

    #[test]
    fn test_rejects_overlap_in_same_slot() {
        let err = FieldLayout::builder("Bad")
            .address("a", 0, 0)
            .address("b", 0, 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, LayoutError::OverlappingFields { slot_offset: 0, .. }));

        let err = FieldLayout::builder("Bad")
            .uint("a", 0, 0, 8)
            .uint("b", 0, 7, 2)
            .build()
            .unwrap_err();
        assert!(matches!(err, LayoutError::OverlappingFields { .. }));
    }

    #[test]
    fn test_same_bytes_in_different_slots_are_fine() {
        FieldLayout::builder("Ok")
            .address("a", 0, 0)
            .address("b", 1, 0)
            .uint("c", 0, 20, 12)
            .build()
            .unwrap();
    }

    #[test]
    fn test_kind_width_rules() {
        let err = FieldLayout::new("Bad", vec![FieldSpec::new("f", FieldKind::Bool, 0, 0, 2)])
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidBoolEncoding {
                field: "f".into(),
                width: 2
            }
        );

        let err = FieldLayout::new(
            "Bad",
            vec![FieldSpec::new("a", FieldKind::Address, 0, 0, 32)],
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidAddressWidth { width: 32, .. }));

        let err = FieldLayout::builder("Bad").uint("z", 0, 0, 0).build().unwrap_err();
        assert!(matches!(err, LayoutError::ZeroWidthField { .. }));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let err = FieldLayout::builder("Dup")
            .uint("x", 0, 0, 1)
            .uint("x", 1, 0, 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateField { .. }));

        let err = FieldLayout::new("Empty", vec![]).unwrap_err();
        assert!(matches!(err, LayoutError::EmptyLayout { .. }));
    }

    #[test]
    fn test_field_spec_from_toml() {
        let spec: FieldSpec = toml::from_str(
            r#"
            name = "owner"
            byte_offset = 12
            byte_length = 20
            kind = "address"
            "#,
        )
        .unwrap();
        assert_eq!(spec.slot_offset, 0);
        assert_eq!(spec.kind, FieldKind::Address);
    }
}
