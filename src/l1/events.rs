use ethers::{
    types::{Address, Bytes, Log, H256, U256},
    utils::keccak256,
};
use eyre::Result;
use once_cell::sync::Lazy;

/// Topic of the `SequencerBatchAppended` event emitted by the canonical
/// transaction chain when the sequencer appends a batch.
pub static SEQUENCER_BATCH_APPENDED_TOPIC: Lazy<H256> =
    Lazy::new(|| H256::from_slice(&keccak256("SequencerBatchAppended(uint256,uint256,uint256)")));

/// Topic of the companion `TransactionBatchAppended` event, emitted by the
/// same contract in the same L1 transaction, one log before the
/// `SequencerBatchAppended` event.
pub static TRANSACTION_BATCH_APPENDED_TOPIC: Lazy<H256> = Lazy::new(|| {
    H256::from_slice(&keccak256(
        "TransactionBatchAppended(uint256,bytes32,uint256,uint256,bytes)",
    ))
});

/// A decoded `SequencerBatchAppended` event. This is the unit of work
/// delivered to the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAppendedEvent {
    /// The queue index of the first queue transaction referenced by the batch
    pub starting_queue_index: u64,
    /// The number of queue transactions referenced by the batch
    pub num_queue_elements: u64,
    /// The total number of chain elements after the batch is appended
    pub total_elements: u64,
    /// The contract that emitted the event
    pub address: Address,
    /// The hash of the L1 transaction that carried the batch
    pub l1_transaction_hash: H256,
    /// The index of this log within its L1 block
    pub log_index: u64,
    /// The L1 block the event was included in
    pub block_number: u64,
}

impl TryFrom<Log> for BatchAppendedEvent {
    type Error = eyre::Report;

    fn try_from(log: Log) -> Result<Self> {
        let data = validate_event_log(&log, 3 * 32)?;

        Ok(Self {
            starting_queue_index: word_to_u64(&data[0..32])?,
            num_queue_elements: word_to_u64(&data[32..64])?,
            total_elements: word_to_u64(&data[64..96])?,
            address: log.address,
            l1_transaction_hash: log
                .transaction_hash
                .ok_or(eyre::eyre!("event log not included in a transaction"))?,
            log_index: log
                .log_index
                .ok_or(eyre::eyre!("event log missing log index"))?
                .as_u64(),
            block_number: log
                .block_number
                .ok_or(eyre::eyre!("event log missing block number"))?
                .as_u64(),
        })
    }
}

/// A decoded `TransactionBatchAppended` event carrying the batch header
/// metadata that the `SequencerBatchAppended` event omits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSubmittedEvent {
    /// The batch's sequence number on the settlement chain
    pub batch_index: u64,
    /// The claimed content digest of the batch
    pub batch_root: H256,
    /// The number of leaf transactions in the batch
    pub batch_size: u64,
    /// The global transaction count immediately before this batch
    pub prev_total_elements: u64,
    /// Opaque bytes carried alongside the batch, not parsed here
    pub extra_data: Bytes,
    /// The hash of the L1 transaction that emitted the event
    pub l1_transaction_hash: H256,
    /// The index of this log within its L1 block
    pub log_index: u64,
}

impl TryFrom<Log> for BatchSubmittedEvent {
    type Error = eyre::Report;

    fn try_from(log: Log) -> Result<Self> {
        // 4 head words: batch root, batch size, prev total elements, and
        // the offset of the dynamic extra data bytes.
        let data = validate_event_log(&log, 4 * 32)?;

        let batch_index = log
            .topics
            .get(1)
            .map(|topic| U256::from_big_endian(topic.as_bytes()))
            .ok_or(eyre::eyre!("event log missing indexed batch index"))?;

        let batch_root = H256::from_slice(&data[0..32]);
        let batch_size = word_to_u64(&data[32..64])?;
        let prev_total_elements = word_to_u64(&data[64..96])?;

        let extra_data_offset: usize = word_to_u64(&data[96..128])?.try_into()?;
        if data.len() < extra_data_offset + 32 {
            eyre::bail!("extra data offset out of bounds");
        }
        let extra_data_len: usize =
            word_to_u64(&data[extra_data_offset..extra_data_offset + 32])?.try_into()?;
        let extra_data_start = extra_data_offset + 32;
        if data.len() < extra_data_start + extra_data_len {
            eyre::bail!("extra data length out of bounds");
        }
        let extra_data = data[extra_data_start..extra_data_start + extra_data_len]
            .to_vec()
            .into();

        Ok(Self {
            batch_index: batch_index
                .try_into()
                .map_err(|_| eyre::eyre!("invalid batch index"))?,
            batch_root,
            batch_size,
            prev_total_elements,
            extra_data,
            l1_transaction_hash: log
                .transaction_hash
                .ok_or(eyre::eyre!("event log not included in a transaction"))?,
            log_index: log
                .log_index
                .ok_or(eyre::eyre!("event log missing log index"))?
                .as_u64(),
        })
    }
}

fn validate_event_log<'a>(log: &'a Log, min_len: usize) -> Result<&'a [u8]> {
    if log.data.len() < min_len {
        eyre::bail!(
            "event data too short: {} < {}",
            log.data.len(),
            min_len
        );
    }
    Ok(&log.data)
}

fn word_to_u64(word: &[u8]) -> Result<u64> {
    U256::from_big_endian(word)
        .try_into()
        .map_err(|_| eyre::eyre!("event word does not fit in u64"))
}
