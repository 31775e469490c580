use eyre::Result;

use crate::common::RawTransactionSlice;

use super::uint_be;

/// The first 12 bytes of `appendSequencerBatch` calldata are the 4-byte
/// function selector, a 5-byte `shouldStartAtElement`, and a 3-byte
/// `totalElementsToAppend`, none of which are interpreted here.
const NUM_CONTEXTS_OFFSET: usize = 12;

/// Offset of the first context block.
const CONTEXTS_OFFSET: usize = 15;

/// Size of one encoded context block.
const CONTEXT_SIZE: usize = 16;

/// Size of the big-endian length prefix of each transaction slice.
const TX_LEN_PREFIX_SIZE: usize = 3;

/// One context block from the batch calldata header: a run of sequenced
/// transactions plus a count of subsequent queue transactions, all
/// attributed to one L1 timestamp and block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchContext {
    pub num_sequenced_transactions: u64,
    pub num_subsequent_queue_transactions: u64,
    pub timestamp: u64,
    pub block_number: u64,
}

impl BatchContext {
    /// Binary Format
    /// ```md
    /// +---------+--------------------------------+
    /// | Bytes   | Field                          |
    /// +---------+--------------------------------+
    /// | 3       | NumSequencedTransactions       |
    /// | 3       | NumSubsequentQueueTransactions |
    /// | 5       | Timestamp                      |
    /// | 5       | BlockNumber                    |
    /// +---------+--------------------------------+
    /// ```
    fn from_data(data: &[u8]) -> Self {
        Self {
            num_sequenced_transactions: uint_be(&data[0..3]),
            num_subsequent_queue_transactions: uint_be(&data[3..6]),
            timestamp: uint_be(&data[6..11]),
            block_number: uint_be(&data[11..16]),
        }
    }
}

/// The decoded layout of one `appendSequencerBatch` call: the ordered
/// context list and a cursor over the raw transaction slices that follow
/// the contexts.
#[derive(Debug)]
pub struct BatchCalldata<'a> {
    pub contexts: Vec<BatchContext>,
    pub slices: TransactionSlices<'a>,
}

/// A cursor over the length-prefixed transaction slices at the tail of
/// batch calldata. There is exactly one cursor per batch: slices appear in
/// on-chain emission order and are consumed strictly sequentially across
/// all contexts, never reset per context.
#[derive(Debug)]
pub struct TransactionSlices<'a> {
    data: &'a [u8],
    offset: usize,
}

impl TransactionSlices<'_> {
    /// Extracts the next transaction slice and advances the cursor.
    /// A length prefix that runs past the end of the calldata is a hard
    /// decode error, never a silent truncation.
    pub fn next_slice(&mut self) -> Result<RawTransactionSlice> {
        let len_end = self.offset + TX_LEN_PREFIX_SIZE;
        if self.data.len() < len_end {
            eyre::bail!("missing transaction length prefix at offset {}", self.offset);
        }

        let tx_len = uint_be(&self.data[self.offset..len_end]) as usize;
        let tx_end = len_end + tx_len;
        if self.data.len() < tx_end {
            eyre::bail!(
                "transaction length {} at offset {} exceeds remaining calldata",
                tx_len,
                self.offset
            );
        }

        self.offset = tx_end;
        Ok(RawTransactionSlice(self.data[len_end..tx_end].to_vec()))
    }
}

/// Decodes the compacted `appendSequencerBatch` calldata layout into its
/// context list and transaction slice cursor.
pub fn decode_batch_calldata(calldata: &[u8]) -> Result<BatchCalldata> {
    if calldata.len() < CONTEXTS_OFFSET {
        eyre::bail!("calldata too short for batch header: {}", calldata.len());
    }

    let num_contexts = uint_be(&calldata[NUM_CONTEXTS_OFFSET..CONTEXTS_OFFSET]) as usize;

    let contexts_end = CONTEXTS_OFFSET + num_contexts * CONTEXT_SIZE;
    if calldata.len() < contexts_end {
        eyre::bail!(
            "calldata too short for {} contexts: {}",
            num_contexts,
            calldata.len()
        );
    }

    let contexts = calldata[CONTEXTS_OFFSET..contexts_end]
        .chunks_exact(CONTEXT_SIZE)
        .map(BatchContext::from_data)
        .collect();

    Ok(BatchCalldata {
        contexts,
        slices: TransactionSlices {
            data: calldata,
            offset: contexts_end,
        },
    })
}
