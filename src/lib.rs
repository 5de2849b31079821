//! slotscope: decode packed EVM contract storage by declarative layout
//!
//! - `domain::storage`: pure slot arithmetic, layouts and field decoding
//! - `infrastructure::ethereum`: keccak hashing and storage readers (alloy, memory)
//! - `modules`: inspection workflows, export and toolkit commands
//! - `config`: TOML config with endpoints, layouts and named arrays

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod modules;
