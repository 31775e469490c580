use ethers::{
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, Block, Bytes, Log, Transaction,
        TransactionRequest, H256, U256, U64,
    },
};

use melchior::{
    backend::{Database, QueueOrigin},
    common::{DecodedTransaction, TransactionSignature, TxType, SEQUENCER_GAS_LIMIT},
    derive::encode_sequencer_transaction,
    driver::ingest_batch,
    l1::{
        BatchAppendedEvent, MockChainProvider, SEQUENCER_BATCH_APPENDED_TOPIC,
        TRANSACTION_BATCH_APPENDED_TOPIC,
    },
};

const CHAIN_ID: u64 = 420;
const L1_BLOCK: u64 = 99;

fn ctc_address() -> Address {
    Address::from([0xcc; 20])
}

fn batch_tx_hash() -> H256 {
    H256::from([0xab; 32])
}

fn word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    U256::from(value).to_big_endian(&mut word);
    word
}

fn uint_bytes(value: u64, size: usize) -> Vec<u8> {
    value.to_be_bytes()[8 - size..].to_vec()
}

/// Encodes `appendSequencerBatch` calldata with a single context
/// containing two sequenced transactions and one queue transaction.
fn batch_calldata() -> Vec<u8> {
    let mut calldata = vec![0u8; 12];
    calldata.extend(uint_bytes(1, 3));

    // context: 2 sequenced, 1 queued, timestamp 100, block number 5
    calldata.extend(uint_bytes(2, 3));
    calldata.extend(uint_bytes(1, 3));
    calldata.extend(uint_bytes(100, 5));
    calldata.extend(uint_bytes(5, 5));

    for nonce in 0..2 {
        let slice = signed_slice(nonce);
        calldata.extend(uint_bytes(slice.len() as u64, 3));
        calldata.extend(slice);
    }

    calldata
}

fn signed_slice(nonce: u64) -> Vec<u8> {
    let wallet = LocalWallet::new(&mut rand::thread_rng()).with_chain_id(CHAIN_ID);

    let mut tx = DecodedTransaction {
        nonce,
        gas_price: 1_000_000,
        gas_limit: 500_000,
        target: Address::from([9; 20]),
        data: vec![0xca, 0xfe].into(),
        sig: TransactionSignature {
            r: U256::zero(),
            s: U256::zero(),
            v: 0,
        },
    };

    let request = TransactionRequest::new()
        .nonce(tx.nonce)
        .gas_price(tx.gas_price)
        .gas(tx.gas_limit)
        .to(tx.target)
        .data(tx.data.clone())
        .chain_id(CHAIN_ID);
    let sig = wallet
        .sign_transaction_sync(&TypedTransaction::Legacy(request))
        .unwrap();
    tx.sig = TransactionSignature {
        r: sig.r,
        s: sig.s,
        v: (sig.v - 35 - 2 * CHAIN_ID) as u8,
    };

    encode_sequencer_transaction(TxType::Eip155, &tx).0
}

fn batch_appended_log() -> Log {
    let mut data = Vec::new();
    data.extend_from_slice(&word(3)); // starting queue index
    data.extend_from_slice(&word(1)); // num queue elements
    data.extend_from_slice(&word(13)); // total elements

    Log {
        address: ctc_address(),
        topics: vec![*SEQUENCER_BATCH_APPENDED_TOPIC],
        data: Bytes::from(data),
        transaction_hash: Some(batch_tx_hash()),
        log_index: Some(U256::from(1)),
        block_number: Some(U64::from(L1_BLOCK)),
        ..Default::default()
    }
}

fn batch_submitted_log(log_index: u64) -> Log {
    let mut data = Vec::new();
    data.extend_from_slice(&H256::from([0x44; 32]).0); // batch root
    data.extend_from_slice(&word(3)); // batch size
    data.extend_from_slice(&word(10)); // prev total elements
    data.extend_from_slice(&word(128)); // extra data offset
    data.extend_from_slice(&word(0)); // extra data length

    Log {
        address: ctc_address(),
        topics: vec![*TRANSACTION_BATCH_APPENDED_TOPIC, H256::from_low_u64_be(7)],
        data: Bytes::from(data),
        transaction_hash: Some(batch_tx_hash()),
        log_index: Some(U256::from(log_index)),
        block_number: Some(U64::from(L1_BLOCK)),
        ..Default::default()
    }
}

fn mock_provider(companion: Option<Log>) -> MockChainProvider {
    let mut provider = MockChainProvider {
        finalized_block: L1_BLOCK,
        ..Default::default()
    };

    provider.transactions.insert(
        batch_tx_hash(),
        Transaction {
            hash: batch_tx_hash(),
            from: Address::from([0x55; 20]),
            input: Bytes::from(batch_calldata()),
            ..Default::default()
        },
    );

    provider.blocks.insert(
        L1_BLOCK,
        Block {
            number: Some(U64::from(L1_BLOCK)),
            timestamp: U256::from(1_000_000),
            ..Default::default()
        },
    );

    provider.logs.push(batch_appended_log());
    if let Some(companion) = companion {
        provider.logs.push(companion);
    }

    provider
}

fn appended_event() -> BatchAppendedEvent {
    BatchAppendedEvent::try_from(batch_appended_log()).unwrap()
}

#[tokio::test]
async fn test_ingest_batch_end_to_end() {
    let provider = mock_provider(Some(batch_submitted_log(0)));
    let db = Database::new(Database::fallback_location());

    let derived = ingest_batch(&provider, &db, CHAIN_ID, &appended_event())
        .await
        .unwrap();

    assert_eq!(derived.transactions.len(), 3);

    // The batch entry carries the companion event's metadata and the L1
    // inclusion point.
    let batch = db.batch_by_index(7).unwrap().unwrap();
    assert_eq!(batch.root, H256::from([0x44; 32]));
    assert_eq!(batch.size, 3);
    assert_eq!(batch.prev_total_elements, 10);
    assert_eq!(batch.block_number, L1_BLOCK);
    assert_eq!(batch.timestamp, 1_000_000);
    assert_eq!(batch.submitter, Address::from([0x55; 20]));

    // Entries fill the contiguous index range [10, 13).
    for index in 10..12 {
        let entry = db.transaction_by_index(index).unwrap().unwrap();
        assert_eq!(entry.index, index);
        assert_eq!(entry.batch_index, 7);
        assert_eq!(entry.queue_origin, QueueOrigin::Sequencer);
        assert_eq!(entry.timestamp, 100);
        assert_eq!(entry.block_number, 5);
        assert_eq!(entry.gas_limit, SEQUENCER_GAS_LIMIT);
        assert_eq!(entry.tx_type, Some(TxType::Eip155));
        assert!(entry.decoded.is_some());
    }

    let provisional = db.transaction_by_index(12).unwrap().unwrap();
    assert_eq!(provisional.queue_origin, QueueOrigin::L1);
    assert_eq!(provisional.queue_index, Some(3));
    assert_eq!(provisional.block_number, 0);
    assert_eq!(provisional.timestamp, 0);
    assert_eq!(provisional.decoded, None);

    // The reverse lookup lets the queue pipeline find the provisional
    // entry by its queue index.
    assert_eq!(db.transaction_index_by_queue_index(3).unwrap(), Some(12));

    assert_eq!(db.latest_batch_index().unwrap(), Some(7));
    assert_eq!(db.latest_transaction_index().unwrap(), Some(12));

    db.clear().unwrap();
}

#[tokio::test]
async fn test_missing_companion_event_is_fatal() {
    let provider = mock_provider(None);
    let db = Database::new(Database::fallback_location());

    let res = ingest_batch(&provider, &db, CHAIN_ID, &appended_event()).await;
    assert!(res.is_err());

    // Nothing was stored for the failed batch.
    assert_eq!(db.latest_batch_index().unwrap(), None);
    assert_eq!(db.latest_transaction_index().unwrap(), None);
    assert_eq!(db.transaction_index_by_queue_index(3).unwrap(), None);

    db.clear().unwrap();
}

#[tokio::test]
async fn test_companion_event_at_wrong_log_index_is_fatal() {
    // A companion event exists on the same transaction but is not the log
    // immediately preceding the batch appended event.
    let provider = mock_provider(Some(batch_submitted_log(5)));
    let db = Database::new(Database::fallback_location());

    let res = ingest_batch(&provider, &db, CHAIN_ID, &appended_event()).await;
    assert!(res.is_err());
    assert_eq!(db.latest_batch_index().unwrap(), None);

    db.clear().unwrap();
}

#[tokio::test]
async fn test_truncated_calldata_is_fatal() {
    let mut provider = mock_provider(Some(batch_submitted_log(0)));

    // Chop the tail off the last transaction slice.
    let tx = provider.transactions.get_mut(&batch_tx_hash()).unwrap();
    let truncated = tx.input[..tx.input.len() - 10].to_vec();
    tx.input = Bytes::from(truncated);

    let db = Database::new(Database::fallback_location());

    let res = ingest_batch(&provider, &db, CHAIN_ID, &appended_event()).await;
    assert!(res.is_err());
    assert_eq!(db.latest_transaction_index().unwrap(), None);

    db.clear().unwrap();
}
