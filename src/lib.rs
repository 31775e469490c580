/// Common types shared across modules
pub mod common;

/// Configuration management
pub mod config;

/// A module for ingesting L1 chain data
pub mod l1;

/// The derivation pipeline for decoding sequencer batches into transaction entries
pub mod derive;

/// A module for persisting batch and transaction entries
pub mod backend;

/// A module for driving batch ingestion from L1 events into the backend
pub mod driver;

/// Application telemetry and logging
pub mod telemetry;

/// RPC module to host rpc server
pub mod rpc;
