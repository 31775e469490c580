use ethers::types::Address;
use eyre::Result;

use crate::{
    backend::{QueueOrigin, TransactionBatchEntry, TransactionEntry},
    common::TxType,
    l1::BatchAppendedEvent,
};

use super::{
    decode_batch_calldata, decode_sequencer_transaction, metadata::BatchMetadata,
    validate_soft_fork,
};

/// The fully derived form of one appended batch: the batch entry plus the
/// ordered transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedBatch {
    pub batch: TransactionBatchEntry,
    pub transactions: Vec<DerivedTransaction>,
}

/// One derived transaction. Queue-origin transactions are tagged as
/// provisional instead of being materialized with sentinel zeros, so that
/// the pending state stays explicit until the queue-message pipeline
/// resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedTransaction {
    /// A sequencer transaction with all fields known at ingestion time
    Sequenced(TransactionEntry),
    /// A queue-origin stub awaiting out-of-band resolution
    Provisional {
        /// The assigned global index
        index: u64,
        /// The containing batch
        batch_index: u64,
        /// The cross-layer message this entry references
        queue_index: u64,
    },
}

impl DerivedTransaction {
    /// The global index assigned to this transaction.
    pub fn index(&self) -> u64 {
        match self {
            Self::Sequenced(entry) => entry.index,
            Self::Provisional { index, .. } => *index,
        }
    }

    /// The referenced queue index, for provisional transactions.
    pub fn queue_index(&self) -> Option<u64> {
        match self {
            Self::Sequenced(_) => None,
            Self::Provisional { queue_index, .. } => Some(*queue_index),
        }
    }

    /// Materializes the storable entry. Provisional transactions take the
    /// placeholder shape: zeroed attribution fields, `queue_origin = l1`,
    /// and no decoded payload.
    pub fn to_entry(&self) -> TransactionEntry {
        match self {
            Self::Sequenced(entry) => entry.clone(),
            Self::Provisional {
                index,
                batch_index,
                queue_index,
            } => TransactionEntry {
                index: *index,
                batch_index: *batch_index,
                block_number: 0,
                timestamp: 0,
                gas_limit: 0,
                target: Address::zero(),
                origin: Some(Address::zero()),
                data: Default::default(),
                queue_origin: QueueOrigin::L1,
                queue_index: Some(*queue_index),
                tx_type: Some(TxType::Eip155),
                decoded: None,
            },
        }
    }
}

/// Derives the ordered entry list for one appended batch.
///
/// Contexts are processed in on-chain order. For each context the
/// sequenced transactions are pulled first from the shared slice cursor,
/// then the context's queue transactions are emitted as provisional stubs.
/// This interleaving is the ordering contract the rest of the system
/// depends on to reconstruct on-chain transaction order; the produced
/// indices form the contiguous range
/// `[prev_total_elements, prev_total_elements + batch_size)`.
pub fn derive_batch(
    event: &BatchAppendedEvent,
    metadata: &BatchMetadata,
    l2_chain_id: u64,
) -> Result<DerivedBatch> {
    let mut calldata = decode_batch_calldata(&metadata.calldata)?;

    let batch = TransactionBatchEntry {
        index: metadata.batch_index,
        root: metadata.batch_root,
        size: metadata.batch_size,
        prev_total_elements: metadata.prev_total_elements,
        extra_data: metadata.extra_data.clone(),
        block_number: metadata.block_number,
        timestamp: metadata.timestamp,
        submitter: metadata.submitter,
        l1_transaction_hash: metadata.l1_transaction_hash,
    };

    let mut transactions = Vec::with_capacity(metadata.batch_size as usize);
    let mut transaction_index: u64 = 0;
    let mut enqueued_count: u64 = 0;

    for context in &calldata.contexts {
        for _ in 0..context.num_sequenced_transactions {
            let slice = calldata.slices.next_slice()?;
            let (tx_type, decoded) = decode_sequencer_transaction(&slice);

            let accepted = validate_soft_fork(tx_type, decoded.as_ref(), l2_chain_id);
            if !accepted {
                tracing::warn!(
                    "dropping payload of rejected transaction at index {}: {:?}",
                    metadata.prev_total_elements + transaction_index,
                    slice
                );
            }

            transactions.push(DerivedTransaction::Sequenced(TransactionEntry {
                index: metadata.prev_total_elements + transaction_index,
                batch_index: metadata.batch_index,
                block_number: context.block_number,
                timestamp: context.timestamp,
                gas_limit: metadata.gas_limit,
                target: Address::zero(),
                origin: None,
                data: slice.0.into(),
                queue_origin: QueueOrigin::Sequencer,
                queue_index: None,
                tx_type,
                // A recognized but rejected transaction keeps its type tag
                // with no decoded payload.
                decoded: if accepted { decoded } else { None },
            }));
            transaction_index += 1;
        }

        for _ in 0..context.num_subsequent_queue_transactions {
            transactions.push(DerivedTransaction::Provisional {
                index: metadata.prev_total_elements + transaction_index,
                batch_index: metadata.batch_index,
                queue_index: event.starting_queue_index + enqueued_count,
            });
            enqueued_count += 1;
            transaction_index += 1;
        }
    }

    Ok(DerivedBatch {
        batch,
        transactions,
    })
}
