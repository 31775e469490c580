use std::sync::Arc;

use eyre::Result;

use crate::{
    backend::{Database, HeadInfo},
    config::Config,
    derive::{derive_batch, BatchMetadata, DerivedBatch},
    l1::{BatchAppendedEvent, ChainProvider, ChainWatcher, EthersChainProvider, WatcherUpdate},
    rpc,
    telemetry::metrics,
};

/// Driver is responsible for advancing the entry store by feeding batch
/// events from the chain watcher through the derivation pipeline.
pub struct Driver {
    /// Global config
    config: Arc<Config>,
    /// Provider used to resolve batch metadata
    provider: EthersChainProvider,
    /// Watcher that delivers batch events in on-chain order
    watcher: ChainWatcher,
    /// The entry store
    db: Database,
}

impl Driver {
    /// Creates a new Driver instance. Scanning resumes from the persisted
    /// head watermark when one exists.
    pub fn from_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let db = config
            .db_location
            .as_ref()
            .map(Database::new)
            .unwrap_or_default();

        let start_block = match db.read_head()? {
            Some(head) => head.l1_block + 1,
            None => config.chain.l1_start_block,
        };

        let provider = EthersChainProvider::new(&config.l1_rpc_url)?;
        let watcher = ChainWatcher::new(start_block, config.clone());

        Ok(Self {
            config,
            provider,
            watcher,
            db,
        })
    }

    /// Runs the Driver
    pub async fn start(&mut self) -> Result<()> {
        rpc::run_server(self.config.clone(), self.db.clone()).await?;
        self.watcher.start()?;

        loop {
            self.advance().await?;
        }
    }

    /// Shuts down the driver
    pub async fn shutdown(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    /// Processes the next watcher update. Errors are fatal for the run:
    /// skipping a failed batch would corrupt the global index sequence.
    pub async fn advance(&mut self) -> Result<()> {
        let update = self
            .watcher
            .recv_from_channel()
            .await
            .ok_or(eyre::eyre!("watcher channel closed"))?;

        match update {
            WatcherUpdate::BatchAppended(event) => {
                let derived = ingest_batch(
                    &self.provider,
                    &self.db,
                    self.config.chain.l2_chain_id,
                    &event,
                )
                .await?;

                tracing::info!(
                    "ingested batch {} with {} transactions",
                    derived.batch.index,
                    derived.transactions.len()
                );

                metrics::LATEST_BATCH_INDEX.set(derived.batch.index as i64);
                if let Some(tx) = derived.transactions.last() {
                    metrics::LATEST_TRANSACTION_INDEX.set(tx.index() as i64);
                }
            }
            WatcherUpdate::ScannedToBlock(block) => {
                // The watermark only advances once every batch in the
                // range has been fully persisted.
                self.db.write_head(HeadInfo { l1_block: block })?;
                self.db.flush_async().await?;
                metrics::SCANNED_HEAD.set(block as i64);
            }
        }

        Ok(())
    }
}

/// Runs the single-event ingestion pipeline: resolve the batch metadata,
/// derive the ordered entry list, and persist it.
///
/// The batch is assembled fully in memory before the first store call, so
/// a fatal error leaves the store untouched for this batch. Every
/// provisional entry additionally records a reverse lookup from its queue
/// index to the assigned global index so the queue-resolution pipeline can
/// later patch the placeholder fields.
pub async fn ingest_batch<P: ChainProvider>(
    provider: &P,
    db: &Database,
    l2_chain_id: u64,
    event: &BatchAppendedEvent,
) -> Result<DerivedBatch> {
    let metadata = BatchMetadata::resolve(provider, event).await?;
    let derived = derive_batch(event, &metadata, l2_chain_id)?;

    db.put_batch_entries(std::slice::from_ref(&derived.batch))?;

    let entries: Vec<_> = derived.transactions.iter().map(|tx| tx.to_entry()).collect();
    db.put_transaction_entries(&entries)?;

    for tx in &derived.transactions {
        if let Some(queue_index) = tx.queue_index() {
            db.put_transaction_index_by_queue_index(queue_index, tx.index())?;
        }
    }

    db.flush_async().await?;

    Ok(derived)
}
