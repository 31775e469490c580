//! Telemetry module
//!
//! This module encompasses telemetry and logging.
//!
//! ### Logging
//!
//! Logging is constructed using the [tracing](https://crates.io/crates/tracing) crate.
//! Use the [crate::telemetry::init] function to initialize a global logger,
//! passing in a boolean `verbose` parameter. This function will error if a
//! logger has already been initialized.
//!
//! ### Metrics
//!
//! Metrics are collected using the [prometheus](https://crates.io/crates/prometheus) crate
//! and served on port 9200.

pub mod logging;
pub use logging::{get_subscriber, init, init_subscriber, AnsiTermLayer, AnsiVisitor};

pub mod metrics;
pub use metrics::{
    init as init_metrics, LATEST_BATCH_INDEX, LATEST_TRANSACTION_INDEX, SCANNED_HEAD,
};

pub mod shutdown;
pub use shutdown::register_shutdown;
