//! L1 chain access: the batch event definitions, the [ChainProvider]
//! abstraction over settlement-chain queries, and the [ChainWatcher] that
//! scans the canonical transaction chain contract for appended batches.

mod events;
pub use events::{
    BatchAppendedEvent, BatchSubmittedEvent, SEQUENCER_BATCH_APPENDED_TOPIC,
    TRANSACTION_BATCH_APPENDED_TOPIC,
};

mod provider;
pub use provider::{ChainProvider, EthersChainProvider};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockChainProvider;

mod chain_watcher;
pub use chain_watcher::{ChainWatcher, WatcherUpdate};
