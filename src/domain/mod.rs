//! Domain layer - storage layouts, decoding and slot arithmetic

pub mod storage;
