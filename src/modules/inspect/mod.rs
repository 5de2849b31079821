//! Storage inspection workflows
//!
//! Walks dynamic arrays of packed structs and reads single structs from a
//! contract's storage. The block is resolved once up front so that every word
//! of every element comes from the same height.

use alloy::primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::domain::storage::{
    decode_fields, ArrayDescriptor, DecodedStruct, FieldLayout, SlotHasher, StorageReader,
    StorageSlot,
};

pub const DEFAULT_MAX_ELEMENTS: u64 = 10_000;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// One decoded array element
#[derive(Debug, Clone, Serialize)]
pub struct ElementRecord {
    pub index: u64,
    pub slot: StorageSlot,
    pub fields: DecodedStruct,
}

/// A full dynamic array read at one block
#[derive(Debug, Clone, Serialize)]
pub struct ArraySnapshot {
    pub address: String,
    pub layout: String,
    pub block: u64,
    pub declared_slot: StorageSlot,
    pub base_slot: StorageSlot,
    pub stride: u64,
    pub length: u64,
    pub elements: Vec<ElementRecord>,
    #[serde(skip)]
    pub field_names: Vec<String>,
}

/// A single struct read at one block
#[derive(Debug, Clone, Serialize)]
pub struct StructSnapshot {
    pub address: String,
    pub layout: String,
    pub block: u64,
    pub slot: StorageSlot,
    pub fields: DecodedStruct,
}

pub struct Inspector<'a> {
    reader: &'a dyn StorageReader,
    hasher: &'a dyn SlotHasher,
    max_elements: u64,
    concurrency: usize,
}

impl<'a> Inspector<'a> {
    pub fn new(reader: &'a dyn StorageReader, hasher: &'a dyn SlotHasher) -> Self {
        Self {
            reader,
            hasher,
            max_elements: DEFAULT_MAX_ELEMENTS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Refuse arrays whose length word is larger than this
    pub fn max_elements(mut self, max: u64) -> Self {
        self.max_elements = max;
        self
    }

    /// Number of elements fetched in parallel
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn resolve_block(&self, block: Option<u64>) -> Result<u64> {
        match block {
            Some(block) => Ok(block),
            None => self.reader.block_number().await,
        }
    }

    async fn read_words(&self, address: Address, slots: &[StorageSlot], block: u64) -> Result<Vec<B256>> {
        let mut words = Vec::with_capacity(slots.len());
        for slot in slots {
            words.push(self.reader.storage_at(address, *slot, block).await?);
        }
        Ok(words)
    }

    pub async fn read_array(
        &self,
        address: Address,
        descriptor: &ArrayDescriptor,
        layout: &FieldLayout,
        block: Option<u64>,
    ) -> Result<ArraySnapshot> {
        let block = self.resolve_block(block).await?;
        let length_word = self
            .reader
            .storage_at(address, descriptor.declared_slot, block)
            .await
            .context("read array length")?;
        let length = U256::from_be_bytes(length_word.0);

        // A wrong declared slot usually shows up as an absurd length
        if length > U256::from(self.max_elements) {
            bail!(
                "array length {} at slot {} exceeds the limit of {} elements; check the declared slot",
                length,
                descriptor.declared_slot,
                self.max_elements
            );
        }
        let length = length.to::<u64>();

        let base_slot = descriptor.base_slot(self.hasher);
        tracing::info!(
            endpoint = %self.reader.endpoint_name(),
            %address,
            block,
            length,
            base = %base_slot,
            "reading dynamic array"
        );

        let elements: Vec<ElementRecord> = stream::iter(0..length)
            .map(|index| async move {
                let slots = descriptor.element_word_slots(base_slot, index as i64)?;
                let words = self
                    .read_words(address, &slots, block)
                    .await
                    .with_context(|| format!("read element {index}"))?;
                let fields = decode_fields(&words, layout)
                    .with_context(|| format!("decode element {index}"))?;
                tracing::debug!(index, slot = %slots[0], "decoded element");
                Ok::<_, anyhow::Error>(ElementRecord {
                    index,
                    slot: slots[0],
                    fields,
                })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(ArraySnapshot {
            address: format!("0x{}", hex::encode(address.as_slice())),
            layout: layout.name().to_string(),
            block,
            declared_slot: descriptor.declared_slot,
            base_slot,
            stride: descriptor.stride,
            length,
            elements,
            field_names: layout.field_names().map(str::to_string).collect(),
        })
    }

    /// Read a struct stored directly at `slot..slot + layout.slot_count()`
    pub async fn read_struct(
        &self,
        address: Address,
        slot: StorageSlot,
        layout: &FieldLayout,
        block: Option<u64>,
    ) -> Result<StructSnapshot> {
        let block = self.resolve_block(block).await?;
        let slots: Vec<StorageSlot> = (0..layout.slot_count() as u64).map(|i| slot.offset(i)).collect();
        let words = self.read_words(address, &slots, block).await?;
        let fields = decode_fields(&words, layout)?;
        tracing::info!(%address, block, %slot, layout = layout.name(), "decoded struct");

        Ok(StructSnapshot {
            address: format!("0x{}", hex::encode(address.as_slice())),
            layout: layout.name().to_string(),
            block,
            slot,
            fields,
        })
    }
}
