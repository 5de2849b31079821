//! Command modules
//!
//! - inspect: walks arrays and structs in live or snapshot storage
//! - export: text/JSON/CSV rendering of decoded snapshots
//! - toolkit: slot calculators and hashing

pub mod export;
pub mod inspect;
pub mod toolkit;
