#![warn(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Batch Entry Store
//!
//! This exposes a minimal persistent store for batch and transaction
//! entries, backed by [sled]. Entries are written fully in memory before
//! any store call, so a failed batch leaves the store untouched.
//!
//! ## Example
//!
//! ```rust
//! use melchior::backend::{Database, HeadInfo};
//!
//! // Note: this will panic if both `/tmp/melchior` and the hardcoded temporary location cannot be used.
//! let db = Database::new("/tmp/melchior-doc");
//! let head = HeadInfo { l1_block: 100 };
//! db.write_head(head).unwrap();
//! let read_head = db.read_head().unwrap();
//! assert_eq!(read_head, Some(head));
//! db.clear().unwrap();
//! ```

/// Core Backend Types
mod types;
pub use types::{HeadInfo, QueueOrigin, TransactionBatchEntry, TransactionEntry};

/// Core Backend Database
mod database;
pub use database::Database;
