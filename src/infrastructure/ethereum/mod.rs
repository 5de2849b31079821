//! Ethereum infrastructure - Alloy provider and hashing implementations

mod hasher;
mod memory;
mod provider;

pub use hasher::Keccak256Hasher;
pub use memory::MemoryStorage;
pub use provider::{create_reader, normalize_http_endpoint, AlloyStorageReader, ProviderConfig};
