//! Distribution tree scanning
//!
//! Reads the declarative build metadata of a distribution tree and produces a
//! [`types::Snapshot`] of its sources and packages. Scanning never writes to
//! the tree.
//!
//! # Modules
//!
//! - [`scanner`]: Scanner trait and scan errors
//! - [`types`]: Source, package and snapshot types
//! - [`xbstrap`]: Scanner for xbstrap `bootstrap.yml` trees

pub mod scanner;
pub mod types;
pub mod xbstrap;

pub use scanner::{DistributionScanner, ScanError};
pub use types::{EntryKind, Package, PackageMetadata, SkippedEntry, Snapshot, Source};
pub use xbstrap::XbstrapScanner;
