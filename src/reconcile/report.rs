//! Outcome of a reconciliation pass

use crate::distro::types::SkippedEntry;
use crate::reconcile::error::{PassWarning, ReconcileError};

/// Terminal state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Everything applied and every hook succeeded
    Success,
    /// Presence changes applied, but something non-fatal failed
    Partial,
    /// Scan or store failure; nothing after the failure was applied
    Aborted,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Success => "SUCCESS",
            PassStatus::Partial => "PARTIAL",
            PassStatus::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
    pub sources_added: usize,
    pub sources_updated: usize,
    pub sources_removed: usize,
    pub packages_added: usize,
    pub packages_updated: usize,
    pub packages_removed: usize,
    pub upstream_updates: usize,
}

impl PassCounts {
    pub fn is_empty(&self) -> bool {
        *self == PassCounts::default()
    }
}

/// Summary of a completed pass
#[derive(Debug, Default)]
pub struct PassReport {
    pub counts: PassCounts,
    /// Sources whose upstream version could not be determined
    pub unresolved: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub warnings: Vec<PassWarning>,
}

impl PassReport {
    pub fn status(&self) -> PassStatus {
        if self.warnings.is_empty() {
            PassStatus::Success
        } else {
            PassStatus::Partial
        }
    }

    pub(crate) fn warn(&mut self, warning: impl Into<PassWarning>) {
        self.warnings.push(warning.into());
    }
}

/// Status of a pass result, mapping errors to [`PassStatus::Aborted`]
pub fn status_of(result: &Result<PassReport, ReconcileError>) -> PassStatus {
    match result {
        Ok(report) => report.status(),
        Err(_) => PassStatus::Aborted,
    }
}
