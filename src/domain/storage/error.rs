//! Storage layout errors

use thiserror::Error;

/// Validation failures raised while building layouts or decoding storage words.
///
/// None of these are transient: each one points at a malformed layout,
/// slot, word or index supplied by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Slot input is not a number or does not fit in 256 bits
    #[error("invalid slot `{input}`: {reason}")]
    InvalidSlotInput { input: String, reason: String },

    /// Negative array index
    #[error("array index must be non-negative, got {index}")]
    IndexOutOfRange { index: i64 },

    /// A field references a slot past the end of the supplied words
    #[error("field `{field}` reads slot {slot_offset} but only {available} slot value(s) were supplied")]
    SlotIndexOutOfRange {
        field: String,
        slot_offset: usize,
        available: usize,
    },

    /// A field's byte window runs past the 32-byte slot boundary
    #[error("field `{field}` spans bytes {start}..{end}, past the 32-byte slot boundary")]
    ByteRangeOverflow {
        field: String,
        start: usize,
        end: usize,
    },

    /// A field sits further into the struct than any layout may span
    #[error("field `{field}` is at slot offset {slot_offset}; layouts span at most {max} slots")]
    SlotOffsetTooLarge {
        field: String,
        slot_offset: usize,
        max: usize,
    },

    /// Two fields in the same slot claim overlapping bytes
    #[error("fields `{first}` and `{second}` overlap in slot {slot_offset}")]
    OverlappingFields {
        first: String,
        second: String,
        slot_offset: usize,
    },

    /// A bool field is not exactly one byte wide
    #[error("bool field `{field}` must be 1 byte wide, got {width}")]
    InvalidBoolEncoding { field: String, width: usize },

    /// An address field is not exactly 20 bytes wide
    #[error("address field `{field}` must be 20 bytes wide, got {width}")]
    InvalidAddressWidth { field: String, width: usize },

    #[error("field `{field}` has zero width")]
    ZeroWidthField { field: String },

    #[error("duplicate field name `{field}`")]
    DuplicateField { field: String },

    #[error("layout `{layout}` has no fields")]
    EmptyLayout { layout: String },

    /// Explicit array stride is smaller than the element layout
    #[error("stride of {stride} slot(s) is smaller than the {required} slot(s) one element occupies")]
    StrideTooSmall { stride: u64, required: usize },

    /// Storage word is not hex or is longer than 32 bytes
    #[error("invalid storage word `{input}`: {reason}")]
    InvalidWord { input: String, reason: String },
}

impl LayoutError {
    pub(crate) fn invalid_slot(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSlotInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_word(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidWord {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using LayoutError
pub type LayoutResult<T> = Result<T, LayoutError>;
