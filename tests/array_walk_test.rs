//! End-to-end array walks over in-memory storage
//!
//! Lays out a `LockInfo[] _locks` array the way solc does and checks that
//! the inspector finds and decodes every element.

use alloy::primitives::{Address, B256, U256};
use slotscope::domain::storage::{
    array_base_slot, lock_info_layout, ArrayDescriptor, DecodedValue, FieldLayout, StorageSlot,
};
use slotscope::infrastructure::ethereum::{Keccak256Hasher, MemoryStorage};
use slotscope::modules::export::{render_array, OutputFormat};
use slotscope::modules::inspect::Inspector;

struct Lock {
    user: [u8; 20],
    start_time: u64,
    amount: u128,
}

fn locks() -> Vec<Lock> {
    (0..5u8)
        .map(|i| Lock {
            user: [i + 1; 20],
            start_time: 1_700_000_000 + i as u64,
            amount: 10u128.pow(18) * (i as u128 + 1),
        })
        .collect()
}

/// Store `locks` as a dynamic array at `declared`, `stride` slots per element
fn seed(storage: &mut MemoryStorage, declared: StorageSlot, stride: u64, locks: &[Lock]) {
    storage.set_uint(declared, U256::from(locks.len()));
    let base = array_base_slot(declared, &Keccak256Hasher);
    for (i, lock) in locks.iter().enumerate() {
        let first = base.offset(i as u64 * stride);
        let mut word = [0u8; 32];
        word[4..12].copy_from_slice(&lock.start_time.to_be_bytes());
        word[12..].copy_from_slice(&lock.user);
        storage.set(first, B256::from(word));
        storage.set_uint(first.offset(1), U256::from(lock.amount));
    }
}

fn assert_matches(fields: &slotscope::domain::storage::DecodedStruct, lock: &Lock) {
    assert_eq!(
        fields.get("user"),
        Some(&DecodedValue::Address(Address::from(lock.user)))
    );
    assert_eq!(
        fields.get("start_time"),
        Some(&DecodedValue::Uint(U256::from(lock.start_time)))
    );
    assert_eq!(
        fields.get("amount"),
        Some(&DecodedValue::Uint(U256::from(lock.amount)))
    );
}

#[tokio::test]
async fn test_walks_lock_array_at_slot_zero() {
    let expected = locks();
    let mut storage = MemoryStorage::new().at_block(19);
    seed(&mut storage, StorageSlot::ZERO, 2, &expected);

    let layout = lock_info_layout();
    let descriptor = ArrayDescriptor::new(StorageSlot::ZERO, &layout);
    let snapshot = Inspector::new(&storage, &Keccak256Hasher)
        .concurrency(2)
        .read_array(Address::ZERO, &descriptor, &layout, None)
        .await
        .expect("array walk");

    assert_eq!(snapshot.block, 19);
    assert_eq!(snapshot.length, 5);
    assert_eq!(
        snapshot.base_slot.to_string(),
        "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
    );
    for (i, (record, lock)) in snapshot.elements.iter().zip(&expected).enumerate() {
        assert_eq!(record.index, i as u64);
        assert_eq!(record.slot, snapshot.base_slot.offset(i as u64 * 2));
        assert_matches(&record.fields, lock);
    }
}

#[tokio::test]
async fn test_padded_stride_and_nonzero_slot() {
    let expected = locks();
    let declared = StorageSlot::from_u64(3);
    let mut storage = MemoryStorage::new();
    seed(&mut storage, declared, 4, &expected);

    let layout = lock_info_layout();
    let descriptor = ArrayDescriptor::with_stride(declared, 4, &layout).unwrap();
    let snapshot = Inspector::new(&storage, &Keccak256Hasher)
        .read_array(Address::ZERO, &descriptor, &layout, Some(1))
        .await
        .unwrap();

    assert_eq!(snapshot.elements.len(), expected.len());
    for (record, lock) in snapshot.elements.iter().zip(&expected) {
        assert_matches(&record.fields, lock);
    }
}

#[tokio::test]
async fn test_wrong_declared_slot_decodes_empty() {
    // Reading the length from a slot nobody wrote gives an empty array,
    // not garbage elements
    let mut storage = MemoryStorage::new();
    seed(&mut storage, StorageSlot::ZERO, 2, &locks());

    let layout = lock_info_layout();
    let descriptor = ArrayDescriptor::new(StorageSlot::from_u64(1), &layout);
    let snapshot = Inspector::new(&storage, &Keccak256Hasher)
        .read_array(Address::ZERO, &descriptor, &layout, None)
        .await
        .unwrap();
    assert!(snapshot.elements.is_empty());
}

#[tokio::test]
async fn test_csv_from_walk() {
    let mut storage = MemoryStorage::new();
    seed(&mut storage, StorageSlot::ZERO, 2, &locks());

    let layout: FieldLayout = lock_info_layout();
    let descriptor = ArrayDescriptor::new(StorageSlot::ZERO, &layout);
    let snapshot = Inspector::new(&storage, &Keccak256Hasher)
        .read_array(Address::ZERO, &descriptor, &layout, None)
        .await
        .unwrap();

    let mut buf = Vec::new();
    render_array(&mut buf, &snapshot, OutputFormat::Csv).unwrap();
    let csv = String::from_utf8(buf).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 6);
    assert!(rows[1].ends_with(",1700000000,1000000000000000000"));
    assert!(rows[1].contains(&format!("0x{}", "01".repeat(20))));
}

/// Requires a node at RPC_URL with an esRNT-style contract deployed
#[tokio::test]
#[ignore]
async fn test_live_lock_array() {
    use slotscope::infrastructure::ethereum::{create_reader, ProviderConfig};

    let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
    let address: Address = std::env::var("LOCKS_ADDRESS")
        .unwrap_or_else(|_| "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string())
        .parse()
        .expect("valid address");

    let reader = create_reader(ProviderConfig::Http(rpc_url)).await.expect("connect");
    let layout = lock_info_layout();
    let descriptor = ArrayDescriptor::new(StorageSlot::ZERO, &layout);
    let snapshot = Inspector::new(&reader, &Keccak256Hasher)
        .read_array(address, &descriptor, &layout, None)
        .await
        .expect("read locks");

    println!("✓ {} locks at block {}", snapshot.length, snapshot.block);
    for element in &snapshot.elements {
        println!("  [{}] {:?}", element.index, element.fields);
    }
}
