use ethers::types::{Address, H256};

use melchior::backend::{
    Database, HeadInfo, QueueOrigin, TransactionBatchEntry, TransactionEntry,
};
use melchior::common::TxType;

fn batch_entry(index: u64) -> TransactionBatchEntry {
    TransactionBatchEntry {
        index,
        root: H256::from([1; 32]),
        size: 2,
        prev_total_elements: index * 2,
        extra_data: vec![0xaa].into(),
        block_number: 100 + index,
        timestamp: 1_000_000,
        submitter: Address::from([2; 20]),
        l1_transaction_hash: H256::from([3; 32]),
    }
}

fn transaction_entry(index: u64) -> TransactionEntry {
    TransactionEntry {
        index,
        batch_index: 0,
        block_number: 5,
        timestamp: 100,
        gas_limit: 8_000_000,
        target: Address::zero(),
        origin: None,
        data: vec![0, 1, 2].into(),
        queue_origin: QueueOrigin::Sequencer,
        queue_index: None,
        tx_type: Some(TxType::Eip155),
        decoded: None,
    }
}

#[test]
fn test_batch_entry_round_trip() {
    let db = Database::new(Database::fallback_location());

    let batches = [batch_entry(0), batch_entry(1)];
    db.put_batch_entries(&batches).unwrap();

    assert_eq!(db.batch_by_index(0).unwrap(), Some(batches[0].clone()));
    assert_eq!(db.batch_by_index(1).unwrap(), Some(batches[1].clone()));
    assert_eq!(db.batch_by_index(2).unwrap(), None);
    assert_eq!(db.latest_batch_index().unwrap(), Some(1));

    db.clear().unwrap();
}

#[test]
fn test_transaction_entry_round_trip() {
    let db = Database::new(Database::fallback_location());

    let entries = [transaction_entry(10), transaction_entry(11)];
    db.put_transaction_entries(&entries).unwrap();

    assert_eq!(db.transaction_by_index(10).unwrap(), Some(entries[0].clone()));
    assert_eq!(db.transaction_by_index(9).unwrap(), None);
    assert_eq!(db.latest_transaction_index().unwrap(), Some(11));

    db.clear().unwrap();
}

#[test]
fn test_queue_index_lookup() {
    let db = Database::new(Database::fallback_location());

    db.put_transaction_index_by_queue_index(3, 12).unwrap();
    db.put_transaction_index_by_queue_index(4, 15).unwrap();

    assert_eq!(db.transaction_index_by_queue_index(3).unwrap(), Some(12));
    assert_eq!(db.transaction_index_by_queue_index(4).unwrap(), Some(15));
    assert_eq!(db.transaction_index_by_queue_index(5).unwrap(), None);

    db.clear().unwrap();
}

#[test]
fn test_head_round_trip() {
    let db = Database::new(Database::fallback_location());

    assert_eq!(db.read_head().unwrap(), None);

    let head = HeadInfo { l1_block: 1234 };
    db.write_head(head).unwrap();
    assert_eq!(db.read_head().unwrap(), Some(head));

    db.clear().unwrap();
}

#[test]
fn test_clear_wipes_all_trees() {
    let db = Database::new(Database::fallback_location());

    db.put_batch_entries(&[batch_entry(0)]).unwrap();
    db.put_transaction_entries(&[transaction_entry(0)]).unwrap();
    db.put_transaction_index_by_queue_index(0, 0).unwrap();
    db.clear().unwrap();

    assert_eq!(db.latest_batch_index().unwrap(), None);
    assert_eq!(db.latest_transaction_index().unwrap(), None);
    assert_eq!(db.transaction_index_by_queue_index(0).unwrap(), None);
}
