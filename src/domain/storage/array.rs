//! Slot derivation for dynamic arrays and mappings

use alloy_primitives::U256;
use serde::Serialize;

use super::error::{LayoutError, LayoutResult};
use super::layout::FieldLayout;
use super::slot::StorageSlot;

/// 256-bit hash capability used for content-addressed slot derivation.
///
/// Production code injects keccak256; tests may inject anything deterministic.
pub trait SlotHasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

/// First element slot of the dynamic array whose length lives at `declared_slot`.
///
/// `keccak256(pad32(declared_slot))`, read back as a big-endian integer.
pub fn array_base_slot(declared_slot: StorageSlot, hasher: &dyn SlotHasher) -> StorageSlot {
    StorageSlot::from_be_bytes(hasher.hash(&declared_slot.to_be_bytes()))
}

/// Same as [`array_base_slot`] for a raw big-endian buffer of any length
pub fn array_base_slot_from_bytes(
    declared_slot: &[u8],
    hasher: &dyn SlotHasher,
) -> LayoutResult<StorageSlot> {
    let slot = StorageSlot::from_be_slice(declared_slot)?;
    Ok(array_base_slot(slot, hasher))
}

/// `base + index * stride`, wrapping modulo 2^256.
///
/// There is no upper bound on `index`; the array length is a separate on-chain fact.
pub fn element_slot(base: StorageSlot, index: i64, stride: u64) -> LayoutResult<StorageSlot> {
    let index = u64::try_from(index).map_err(|_| LayoutError::IndexOutOfRange { index })?;
    let delta = U256::from(index).wrapping_mul(U256::from(stride));
    Ok(base.wrapping_add(delta))
}

/// Slot of `mapping[key]` for a mapping declared at `declared_slot`.
///
/// `keccak256(key ++ pad32(declared_slot))` with `key` already padded to 32 bytes.
pub fn mapping_slot(key: [u8; 32], declared_slot: StorageSlot, hasher: &dyn SlotHasher) -> StorageSlot {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&key);
    buf[32..].copy_from_slice(&declared_slot.to_be_bytes());
    StorageSlot::from_be_bytes(hasher.hash(&buf))
}

/// Where a dynamic array of structs lives and how far apart its elements are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayDescriptor {
    pub declared_slot: StorageSlot,
    pub stride: u64,
    #[serde(skip)]
    element_slots: usize,
}

impl ArrayDescriptor {
    /// Stride taken from the element layout's slot count
    pub fn new(declared_slot: StorageSlot, element: &FieldLayout) -> Self {
        Self {
            declared_slot,
            stride: element.slot_count() as u64,
            element_slots: element.slot_count(),
        }
    }

    /// Explicit stride, which must cover every slot the element layout uses
    pub fn with_stride(
        declared_slot: StorageSlot,
        stride: u64,
        element: &FieldLayout,
    ) -> LayoutResult<Self> {
        if stride < element.slot_count() as u64 {
            return Err(LayoutError::StrideTooSmall {
                stride,
                required: element.slot_count(),
            });
        }
        Ok(Self {
            declared_slot,
            stride,
            element_slots: element.slot_count(),
        })
    }

    pub fn base_slot(&self, hasher: &dyn SlotHasher) -> StorageSlot {
        array_base_slot(self.declared_slot, hasher)
    }

    pub fn element_slot(&self, hasher: &dyn SlotHasher, index: i64) -> LayoutResult<StorageSlot> {
        element_slot(self.base_slot(hasher), index, self.stride)
    }

    /// The consecutive slots element `index` occupies, starting at its element slot
    pub fn element_word_slots(&self, base: StorageSlot, index: i64) -> LayoutResult<Vec<StorageSlot>> {
        let first = element_slot(base, index, self.stride)?;
        Ok((0..self.element_slots as u64).map(|i| first.offset(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::registry::lock_info_layout;
    use crate::infrastructure::ethereum::Keccak256Hasher;

    // keccak256(bytes32(0))
    const BASE_OF_SLOT_0: &str = "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563";
    // keccak256(bytes32(1))
    const BASE_OF_SLOT_1: &str = "0xb10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6";

    /// Echoes the input back so arithmetic can be checked without a real hash
    struct IdentityHasher;

    impl SlotHasher for IdentityHasher {
        fn hash(&self, data: &[u8]) -> [u8; 32] {
            let mut out = [0u8; 32];
            out.copy_from_slice(&data[data.len() - 32..]);
            out
        }
    }

    #[test]
    fn test_array_base_slot_vectors() {
        let hasher = Keccak256Hasher;
        assert_eq!(array_base_slot(StorageSlot::ZERO, &hasher).to_string(), BASE_OF_SLOT_0);
        assert_eq!(
            array_base_slot(StorageSlot::from_u64(1), &hasher).to_string(),
            BASE_OF_SLOT_1
        );
    }

    #[test]
    fn test_array_base_slot_from_bytes() {
        let hasher = Keccak256Hasher;
        let base = array_base_slot_from_bytes(&[0u8; 40], &hasher).unwrap();
        assert_eq!(base.to_string(), BASE_OF_SLOT_0);

        let mut wide = vec![0u8; 33];
        wide[0] = 1;
        let err = array_base_slot_from_bytes(&wide, &hasher).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidSlotInput { .. }));
    }

    #[test]
    fn test_injected_hasher_is_used() {
        let base = array_base_slot(StorageSlot::from_u64(9), &IdentityHasher);
        assert_eq!(base, StorageSlot::from_u64(9));
    }

    #[test]
    fn test_element_slot_linearity() {
        let base: StorageSlot = BASE_OF_SLOT_0.parse().unwrap();
        for stride in [1u64, 2, 7] {
            for (i1, i2) in [(0i64, 1i64), (3, 10), (0, 1_000_000)] {
                let a = element_slot(base, i1, stride).unwrap().as_u256();
                let b = element_slot(base, i2, stride).unwrap().as_u256();
                let expected = U256::from((i2 - i1) as u64 * stride);
                assert_eq!(b.wrapping_sub(a), expected);
            }
        }
    }

    #[test]
    fn test_element_slot_wraps() {
        let base = StorageSlot::new(U256::MAX);
        assert_eq!(element_slot(base, 1, 2).unwrap(), StorageSlot::from_u64(1));
        assert_eq!(
            element_slot(StorageSlot::ZERO, i64::MAX, u64::MAX).unwrap().as_u256(),
            U256::from(i64::MAX as u64) * U256::from(u64::MAX)
        );
    }

    #[test]
    fn test_negative_index_rejected() {
        let err = element_slot(StorageSlot::ZERO, -1, 2).unwrap_err();
        assert_eq!(err, LayoutError::IndexOutOfRange { index: -1 });
    }

    #[test]
    fn test_mapping_slot_vector() {
        // balances[0x...01] with the mapping at slot 0
        let mut key = [0u8; 32];
        key[31] = 1;
        let slot = mapping_slot(key, StorageSlot::ZERO, &Keccak256Hasher);
        assert_eq!(
            slot.to_string(),
            "0xada5013122d395ba3c54772283fb069b10426056ef8ca54750cb9bb552a59e7d"
        );
    }

    #[test]
    fn test_descriptor_stride() {
        let layout = lock_info_layout();
        let desc = ArrayDescriptor::new(StorageSlot::ZERO, &layout);
        assert_eq!(desc.stride, 2);

        let err = ArrayDescriptor::with_stride(StorageSlot::ZERO, 1, &layout).unwrap_err();
        assert_eq!(err, LayoutError::StrideTooSmall { stride: 1, required: 2 });

        let wide = ArrayDescriptor::with_stride(StorageSlot::ZERO, 3, &layout).unwrap();
        let base = wide.base_slot(&Keccak256Hasher);
        let slots = wide.element_word_slots(base, 2).unwrap();
        assert_eq!(slots, vec![base.offset(6), base.offset(7)]);
        assert_eq!(wide.element_slot(&Keccak256Hasher, 2).unwrap(), base.offset(6));
    }
}
