use std::{sync::Arc, time::Duration};

use eyre::Result;
use tokio::{spawn, sync::mpsc, task::JoinHandle, time::sleep};

use crate::config::Config;

use super::{BatchAppendedEvent, ChainProvider, EthersChainProvider, SEQUENCER_BATCH_APPENDED_TOPIC};

/// The maximum number of L1 blocks scanned for batch events per log query.
const SCAN_RANGE: u64 = 1000;

/// Handles watching the L1 chain and monitoring for new sequencer batch
/// events. The monitoring loop is spawned in a separate task and
/// communication happens via the internal channel. When ChainWatcher is
/// dropped, the monitoring task is automatically aborted.
pub struct ChainWatcher {
    /// Task handle for the monitoring loop
    handle: Option<JoinHandle<()>>,
    /// Global config
    config: Arc<Config>,
    /// The L1 block scanning starts from
    l1_start_block: u64,
    /// Channel for receiving watcher updates
    update_receiver: Option<mpsc::Receiver<WatcherUpdate>>,
}

/// Updates delivered by the watcher, in on-chain order.
#[derive(Debug)]
pub enum WatcherUpdate {
    /// A new sequencer batch was appended on L1
    BatchAppended(Box<BatchAppendedEvent>),
    /// All blocks up to and including the given block have been scanned
    ScannedToBlock(u64),
}

/// Watcher actually scans the L1 blocks. Runs in its own task and keeps
/// feeding the update channel.
struct InnerWatcher {
    /// Global Config
    config: Arc<Config>,
    /// Provider for L1
    provider: EthersChainProvider,
    /// Channel to send watcher updates
    update_sender: mpsc::Sender<WatcherUpdate>,
    /// The next block to scan
    current_block: u64,
    /// Most recent finalized block
    finalized_block: u64,
}

impl Drop for ChainWatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl ChainWatcher {
    /// Creates a new ChainWatcher. The watcher does not start scanning
    /// until [ChainWatcher::start] is called.
    pub fn new(l1_start_block: u64, config: Arc<Config>) -> Self {
        Self {
            handle: None,
            config,
            l1_start_block,
            update_receiver: None,
        }
    }

    /// Starts the chain watcher at the configured start block
    pub fn start(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        let (handle, recv) = start_watcher(self.l1_start_block, self.config.clone())?;

        self.handle = Some(handle);
        self.update_receiver = Some(recv);

        Ok(())
    }

    /// Resets the chain watcher to the given block number
    pub fn restart(&mut self, l1_start_block: u64) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        let (handle, recv) = start_watcher(l1_start_block, self.config.clone())?;

        self.handle = Some(handle);
        self.update_receiver = Some(recv);
        self.l1_start_block = l1_start_block;

        Ok(())
    }

    /// Attempts to receive a message from the update channel.
    /// Returns an error if the channel contains no messages.
    pub fn try_recv_from_channel(&mut self) -> Result<WatcherUpdate> {
        let receiver = self
            .update_receiver
            .as_mut()
            .ok_or(eyre::eyre!("the watcher hasn't started"))?;

        receiver.try_recv().map_err(eyre::Report::from)
    }

    /// Asynchronously receives from the update channel.
    /// Returns `None` if the channel is closed.
    pub async fn recv_from_channel(&mut self) -> Option<WatcherUpdate> {
        match &mut self.update_receiver {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }
}

impl InnerWatcher {
    fn new(
        config: Arc<Config>,
        update_sender: mpsc::Sender<WatcherUpdate>,
        l1_start_block: u64,
    ) -> Result<Self> {
        let provider = EthersChainProvider::new(&config.l1_rpc_url)?;

        Ok(Self {
            config,
            provider,
            update_sender,
            current_block: l1_start_block,
            finalized_block: 0,
        })
    }

    /// Scans the next block range for batch events and forwards them to
    /// the update channel in on-chain order. Sleeps when the scan has
    /// caught up with the finalized head.
    async fn try_scan_range(&mut self) -> Result<()> {
        if self.current_block > self.finalized_block {
            let finalized_block = self.provider.finalized_block_number().await?;

            if self.finalized_block < finalized_block {
                tracing::debug!("[l1] finalized block updated to {}", finalized_block);
                self.finalized_block = finalized_block;
            }
        }

        if self.current_block <= self.finalized_block {
            let range_end = self
                .finalized_block
                .min(self.current_block + SCAN_RANGE - 1);

            let logs = self
                .provider
                .logs(
                    self.config.chain.ctc_address,
                    *SEQUENCER_BATCH_APPENDED_TOPIC,
                    self.current_block,
                    range_end,
                )
                .await?;

            let mut events = logs
                .into_iter()
                .map(BatchAppendedEvent::try_from)
                .collect::<Result<Vec<_>>>()?;

            // Log queries are not guaranteed to be ordered across blocks
            events.sort_by_key(|event| (event.block_number, event.log_index));

            for event in events {
                self.update_sender
                    .send(WatcherUpdate::BatchAppended(Box::new(event)))
                    .await?;
            }

            self.update_sender
                .send(WatcherUpdate::ScannedToBlock(range_end))
                .await?;

            self.current_block = range_end + 1;
        } else {
            sleep(Duration::from_millis(250)).await;
        }

        Ok(())
    }
}

fn start_watcher(
    l1_start_block: u64,
    config: Arc<Config>,
) -> Result<(JoinHandle<()>, mpsc::Receiver<WatcherUpdate>)> {
    let (update_sender, update_receiver) = mpsc::channel(1000);

    let mut watcher = InnerWatcher::new(config, update_sender, l1_start_block)?;

    let handle = spawn(async move {
        loop {
            tracing::debug!("[l1] scanning for batch events at block {}", watcher.current_block);
            if let Err(err) = watcher.try_scan_range().await {
                tracing::warn!(
                    "failed to scan blocks from {}: {}",
                    watcher.current_block,
                    err
                );
                sleep(Duration::from_millis(250)).await;
            }
        }
    });

    Ok((handle, update_receiver))
}
