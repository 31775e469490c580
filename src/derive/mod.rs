//! The batch derivation pipeline.
//!
//! One ingested `SequencerBatchAppended` event flows through this module in
//! four steps: the [metadata] resolver correlates it with its companion
//! `TransactionBatchAppended` event to recover the full batch header, the
//! [calldata] decoder splits the batch calldata into contexts and raw
//! transaction slices, the [codec] decodes each slice into typed fields,
//! and the [validator] applies the soft-fork acceptance rule. The
//! [assembler] combines the four into the final ordered entry list.

pub mod calldata;
pub use calldata::{decode_batch_calldata, BatchCalldata, BatchContext, TransactionSlices};

pub mod codec;
pub use codec::{decode_sequencer_transaction, encode_sequencer_transaction};

pub mod validator;
pub use validator::validate_soft_fork;

pub mod metadata;
pub use metadata::BatchMetadata;

pub mod assembler;
pub use assembler::{derive_batch, DerivedBatch, DerivedTransaction};

/// Reads a big-endian unsigned integer of up to 8 bytes.
pub(crate) fn uint_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |acc, byte| (acc << 8) | *byte as u64)
}
