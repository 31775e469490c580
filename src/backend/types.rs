use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};

use crate::common::{DecodedTransaction, TxType};

/// Where a transaction entry originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueOrigin {
    /// Submitted directly by the sequencer inside a batch
    #[serde(rename = "sequencer")]
    Sequencer,
    /// Submitted as a cross-layer queue message, included by reference
    #[serde(rename = "l1")]
    L1,
}

/// One appended batch as recorded on the settlement chain. Created once
/// per batch-appended event and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBatchEntry {
    /// The batch's sequence number, unique and monotonically increasing
    pub index: u64,
    /// The claimed content digest of the batch
    pub root: H256,
    /// The number of leaf transactions in the batch
    pub size: u64,
    /// The global transaction count immediately before this batch; the
    /// index offset for every entry in the batch
    pub prev_total_elements: u64,
    /// Opaque bytes carried alongside the batch, not parsed here
    pub extra_data: Bytes,
    /// The L1 block the batch was included in
    pub block_number: u64,
    /// The L1 timestamp the batch was included at
    pub timestamp: u64,
    /// The address that sent the settlement transaction
    pub submitter: Address,
    /// The hash of the settlement transaction
    pub l1_transaction_hash: H256,
}

/// One L2 transaction in the global ordered index.
///
/// Entries with `queue_origin = l1` are provisional: their block number,
/// timestamp, gas limit, target, origin, and data are zero-filled
/// placeholders until the queue-message pipeline patches them through the
/// queue-index reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    /// The global index, `prev_total_elements + offset within the batch`
    pub index: u64,
    /// Back-reference to the containing [TransactionBatchEntry]
    pub batch_index: u64,
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub target: Address,
    pub origin: Option<Address>,
    /// The raw transaction bytes as they appeared in the batch calldata
    pub data: Bytes,
    pub queue_origin: QueueOrigin,
    /// Set iff `queue_origin` is [QueueOrigin::L1]: the sequence number of
    /// the cross-layer message this entry references
    pub queue_index: Option<u64>,
    /// The recognized transaction variant, or `None` if undecodable. A
    /// recognized-but-rejected transaction keeps its type tag with no
    /// decoded payload.
    #[serde(rename = "type")]
    pub tx_type: Option<TxType>,
    /// The decoded fields, present only when the soft-fork rule accepted
    /// the transaction
    pub decoded: Option<DecodedTransaction>,
}

/// Watermark of L1 scanning progress, persisted so restarts resume where
/// the previous run left off.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadInfo {
    /// The highest fully scanned L1 block
    pub l1_block: u64,
}
