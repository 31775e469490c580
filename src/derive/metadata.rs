use ethers::types::{Address, Bytes, H256};
use eyre::Result;

use crate::{
    common::SEQUENCER_GAS_LIMIT,
    l1::{BatchAppendedEvent, BatchSubmittedEvent, ChainProvider, TRANSACTION_BATCH_APPENDED_TOPIC},
};

/// The full metadata of one appended batch, assembled by correlating the
/// `SequencerBatchAppended` event with its companion
/// `TransactionBatchAppended` event on the same settlement transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMetadata {
    /// The L1 timestamp the batch was included at
    pub timestamp: u64,
    /// The L1 block number the batch was included at
    pub block_number: u64,
    /// The address that sent the settlement transaction
    pub submitter: Address,
    /// The raw calldata of the settlement transaction
    pub calldata: Bytes,
    /// The fixed gas limit attributed to sequenced entries
    pub gas_limit: u64,
    /// The hash of the settlement transaction
    pub l1_transaction_hash: H256,
    /// The batch's sequence number on the settlement chain
    pub batch_index: u64,
    /// The number of leaf transactions in the batch
    pub batch_size: u64,
    /// The global transaction count immediately before this batch
    pub prev_total_elements: u64,
    /// The claimed content digest of the batch
    pub batch_root: H256,
    /// Opaque bytes carried alongside the batch
    pub extra_data: Bytes,
}

impl BatchMetadata {
    /// Resolves the metadata for a batch-appended event.
    ///
    /// By contract convention the two batch events are emitted adjacently,
    /// submitted-then-appended, so the companion event is looked up at
    /// exactly `log_index - 1` within the same block and transaction. A
    /// missing companion indicates a malformed or unsupported settlement
    /// contract: the error is fatal and must abort ingestion of the event,
    /// since retrying cannot produce an event that does not exist.
    pub async fn resolve<P: ChainProvider>(
        provider: &P,
        event: &BatchAppendedEvent,
    ) -> Result<Self> {
        let tx = provider
            .transaction_by_hash(event.l1_transaction_hash)
            .await?
            .ok_or(eyre::eyre!(
                "batch transaction {} not found",
                event.l1_transaction_hash
            ))?;

        let block = provider
            .block_by_number(event.block_number)
            .await?
            .ok_or(eyre::eyre!("batch block {} not found", event.block_number))?;

        let companion_log_index = event
            .log_index
            .checked_sub(1)
            .ok_or(eyre::eyre!("batch appended event has no preceding log"))?;

        let companion = provider
            .logs(
                event.address,
                *TRANSACTION_BATCH_APPENDED_TOPIC,
                event.block_number,
                event.block_number,
            )
            .await?
            .into_iter()
            .filter_map(|log| BatchSubmittedEvent::try_from(log).ok())
            .find(|submitted| {
                submitted.l1_transaction_hash == event.l1_transaction_hash
                    && submitted.log_index == companion_log_index
            })
            .ok_or(eyre::eyre!(
                "no companion batch submission event found for batch in {}",
                event.l1_transaction_hash
            ))?;

        Ok(Self {
            timestamp: block.timestamp.as_u64(),
            block_number: event.block_number,
            submitter: tx.from,
            calldata: tx.input,
            gas_limit: SEQUENCER_GAS_LIMIT,
            l1_transaction_hash: event.l1_transaction_hash,
            batch_index: companion.batch_index,
            batch_size: companion.batch_size,
            prev_total_elements: companion.prev_total_elements,
            batch_root: companion.batch_root,
            extra_data: companion.extra_data,
        })
    }
}
