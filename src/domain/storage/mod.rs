//! Storage layout domain models
//!
//! Pure decoding of packed EVM storage words and slot derivation for dynamic
//! arrays and mappings. Hashing and storage access are capabilities injected
//! through [`SlotHasher`] and [`StorageReader`]; implementations live in
//! `infrastructure::ethereum`.

mod array;
mod decoder;
mod error;
mod layout;
mod reader;
mod registry;
mod slot;

pub use array::{
    array_base_slot, array_base_slot_from_bytes, element_slot, mapping_slot, ArrayDescriptor,
    SlotHasher,
};
pub use decoder::{decode_fields, DecodedStruct, DecodedValue};
pub use error::{LayoutError, LayoutResult};
pub use layout::{
    FieldKind, FieldLayout, FieldLayoutBuilder, FieldSpec, ADDRESS_BYTES, MAX_STRUCT_SLOTS, SLOT_BYTES,
};
pub use reader::StorageReader;
pub use registry::{lock_info_layout, LayoutConfig, LayoutRegistry};
pub use slot::{parse_word, StorageSlot};
