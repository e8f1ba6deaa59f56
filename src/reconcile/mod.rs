//! Reconciliation engine
//!
//! Diffs a scanned distribution snapshot against the stored state, applies
//! the difference, resolves upstream versions and drives hooks.
//!
//! # Modules
//!
//! - [`error`]: Fatal errors, hook errors and pass warnings
//! - [`hooks`]: Hook trait and the logging/callback implementations
//! - [`pass`]: The reconciler and its pass loop
//! - [`plan`]: Pure snapshot-vs-store diff
//! - [`report`]: Pass status and counters

pub mod error;
pub mod hooks;
pub mod pass;
pub mod plan;
pub mod report;

pub use error::{HookError, HookEvent, PassWarning, ReconcileError};
pub use hooks::{CallbackHooks, LoggingHooks, ReconcileHooks};
pub use pass::{ReconcileOptions, Reconciler};
pub use plan::{PackageChange, ReconcilePlan, SourceChange};
pub use report::{PassCounts, PassReport, PassStatus, status_of};
