//! Error types for reconciliation passes

use thiserror::Error;

use crate::distro::scanner::ScanError;
use crate::notify::NotifyError;
use crate::store::error::StoreError;
use crate::sync::SyncError;
use crate::upstream::resolver::ResolveError;

/// Errors that abort a pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    #[error("scan task failed: {0}")]
    ScanTask(#[from] tokio::task::JoinError),
}

/// Errors returned or raised by a hook
#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook callback failed: {0}")]
    Callback(#[from] anyhow::Error),

    #[error("hook panicked: {0}")]
    Panicked(String),

    #[error("{} notification(s) failed: {}", .0.len(), join_errors(.0))]
    Notification(Vec<NotifyError>),
}

fn join_errors(errors: &[NotifyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reconciliation events that fire hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    PackageAdded,
    PackageRemoved,
    SourceRemoved,
    LocalVersionUpdated,
    UpstreamVersionUpdated,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PackageAdded => "package_added",
            HookEvent::PackageRemoved => "package_removed",
            HookEvent::SourceRemoved => "source_removed",
            HookEvent::LocalVersionUpdated => "local_version_updated",
            HookEvent::UpstreamVersionUpdated => "upstream_version_updated",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal failure recorded during a pass
#[derive(Debug, Error)]
pub enum PassWarning {
    #[error("repository sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("upstream lookup for {source_name} failed: {error}")]
    Resolution {
        source_name: String,
        error: ResolveError,
    },

    #[error("{event} hook for {subject} failed: {error}")]
    Hook {
        event: HookEvent,
        subject: String,
        error: HookError,
    },
}

impl PassWarning {
    /// Notification failures carried by this warning, if any
    pub fn notification_errors(&self) -> &[NotifyError] {
        match self {
            PassWarning::Hook {
                error: HookError::Notification(errors),
                ..
            } => errors,
            _ => &[],
        }
    }
}
