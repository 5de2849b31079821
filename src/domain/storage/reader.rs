//! Storage access capability

use alloy_primitives::{Address, B256};
use anyhow::Result;

use super::slot::StorageSlot;

/// Read-only access to contract storage.
///
/// Implementations must return words as of `block`; callers rely on that to
/// read every slot of a struct at one height.
#[async_trait::async_trait]
pub trait StorageReader: Send + Sync {
    /// Latest block number known to the backend
    async fn block_number(&self) -> Result<u64>;

    /// `eth_getStorageAt(address, slot, block)`
    async fn storage_at(&self, address: Address, slot: StorageSlot, block: u64) -> Result<B256>;

    /// Display name for logs
    fn endpoint_name(&self) -> String;
}
