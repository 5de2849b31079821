//! In-memory storage backend for snapshots and offline decoding

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};

use crate::domain::storage::{parse_word, StorageReader, StorageSlot};

/// Storage of a single contract held in memory.
///
/// Unset slots read as zero, matching EVM semantics. The address argument of
/// reads is ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    words: HashMap<StorageSlot, B256>,
    block: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block number reported to callers
    pub fn at_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    pub fn set(&mut self, slot: StorageSlot, word: B256) {
        self.words.insert(slot, word);
    }

    pub fn set_uint(&mut self, slot: StorageSlot, value: U256) {
        self.set(slot, B256::from(value.to_be_bytes::<32>()));
    }

    pub fn get(&self, slot: StorageSlot) -> B256 {
        self.words.get(&slot).copied().unwrap_or(B256::ZERO)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse a JSON snapshot of the form `{"<slot>": "<word>", ...}`
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(json).context("snapshot must be a JSON object of slot -> word")?;
        let mut storage = Self::new();
        for (slot, word) in raw {
            let slot: StorageSlot = slot.parse()?;
            let word = parse_word(&word)?;
            storage.set(slot, word);
        }
        Ok(storage)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read snapshot {}", path.display()))?;
        let storage = Self::from_json(&content)
            .with_context(|| format!("parse snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), slots = storage.len(), "loaded storage snapshot");
        Ok(storage)
    }
}

#[async_trait::async_trait]
impl StorageReader for MemoryStorage {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.block)
    }

    async fn storage_at(&self, _address: Address, slot: StorageSlot, _block: u64) -> Result<B256> {
        Ok(self.get(slot))
    }

    fn endpoint_name(&self) -> String {
        "memory".to_string()
    }
}
