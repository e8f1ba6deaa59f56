//! Version ordering under distribution-packaging semantics
//!
//! # Modules
//!
//! - [`compare`]: Parsing and ordering of version strings

pub mod compare;

pub use compare::{VersionComparison, compare, max_version};
