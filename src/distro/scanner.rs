//! Distribution scanner trait

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::distro::types::Snapshot;

/// Trait for reading the current source/package set of a distribution tree
pub trait DistributionScanner: Send + Sync {
    /// Scan the distribution rooted at `root`
    ///
    /// Malformed individual entries are skipped and reported in
    /// [`Snapshot::skipped`]; only an unusable tree is an error.
    fn scan(&self, root: &Path) -> Result<Snapshot, ScanError>;
}

/// Errors that make a whole scan unusable
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("distribution metadata not found at {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid distribution metadata in {}: {message}", path.display())]
    InvalidStructure { path: PathBuf, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ScanError {
    ScanError::Io {
        path: path.into(),
        source,
    }
}
