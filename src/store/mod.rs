//! Persistent reconciliation state
//!
//! SQLite-backed record of the last reconciled sources and packages. Only
//! the reconciler writes to it; everything else reads through the query
//! methods of [`state::StateStore`].
//!
//! # Modules
//!
//! - [`error`]: Store error type
//! - [`sqlite`]: SQLite implementation with schema migrations
//! - [`state`]: Store trait and record types

pub mod error;
pub mod sqlite;
pub mod state;

pub use error::StoreError;
pub use sqlite::Store;
pub use state::{PackageRecord, SourceRecord, StateStore, StoredState};
