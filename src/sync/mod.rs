//! Distribution tree synchronization
//!
//! Brings the local checkout of the distribution tree up to date before a
//! reconciliation pass scans it.

pub mod git;

use std::path::Path;

#[cfg(test)]
use mockall::automock;

use thiserror::Error;

pub use git::GitSync;

/// Result of a successful synchronization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The tree was refreshed from its remote
    Updated,
    /// The tree is not under version control; nothing was done
    NotARepository,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to run {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Trait for refreshing the distribution tree in place
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepositorySync: Send + Sync {
    async fn sync(&self, path: &Path) -> Result<SyncOutcome, SyncError>;
}
