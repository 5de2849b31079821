//! Keccak256 slot hasher

use alloy::primitives::keccak256;

use crate::domain::storage::SlotHasher;

/// The EVM's slot derivation hash
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl SlotHasher for Keccak256Hasher {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        keccak256(data).0
    }
}
