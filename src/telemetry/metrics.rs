//! Prometheus Metrics Module.

use eyre::Result;
use lazy_static::lazy_static;
use prometheus_exporter::{
    prometheus::{register_int_gauge, IntGauge},
    start,
};

lazy_static! {
    /// Tracks the highest L1 block that has been scanned for batch events.
    pub static ref SCANNED_HEAD: IntGauge =
        register_int_gauge!("scanned_head", "highest scanned L1 block").unwrap();
    /// Tracks the index of the most recently ingested batch.
    pub static ref LATEST_BATCH_INDEX: IntGauge =
        register_int_gauge!("latest_batch_index", "latest ingested batch index").unwrap();
    /// Tracks the index of the most recently ingested transaction entry.
    pub static ref LATEST_TRANSACTION_INDEX: IntGauge =
        register_int_gauge!("latest_transaction_index", "latest ingested transaction index")
            .unwrap();
}

/// Starts the metrics server on port 9200
pub fn init() -> Result<()> {
    match start("0.0.0.0:9200".parse()?) {
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
