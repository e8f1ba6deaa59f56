//! Git-backed tree synchronization

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{RepositorySync, SyncError, SyncOutcome};

pub const DEFAULT_REMOTE: &str = "origin";

/// Pulls the distribution tree from a git remote
#[derive(Debug, Clone)]
pub struct GitSync {
    remote: String,
    branch: Option<String>,
}

impl Default for GitSync {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE.to_string(), None)
    }
}

impl GitSync {
    /// `branch` of `None` pulls whatever the checkout currently tracks
    pub fn new(remote: String, branch: Option<String>) -> Self {
        Self { remote, branch }
    }

    fn pull_args(&self, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-C".to_string(),
            path.display().to_string(),
            "pull".to_string(),
            self.remote.clone(),
        ];
        if let Some(branch) = &self.branch {
            args.push(branch.clone());
        }
        args
    }
}

/// A `.git` directory alone is not enough; `git status` must succeed too
pub async fn is_git_repository(path: &Path) -> bool {
    if !path.join(".git").is_dir() {
        return false;
    }

    match Command::new("git")
        .arg("-C")
        .arg(path)
        .arg("status")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(e) => {
            warn!("Error checking if {} is a git repository: {}", path.display(), e);
            false
        }
    }
}

#[async_trait::async_trait]
impl RepositorySync for GitSync {
    async fn sync(&self, path: &Path) -> Result<SyncOutcome, SyncError> {
        if !is_git_repository(path).await {
            warn!("{} is not a git repository, skipping update", path.display());
            return Ok(SyncOutcome::NotARepository);
        }

        let args = self.pull_args(path);
        let command = format!("git {}", args.join(" "));
        info!("Updating distribution tree: {}", command);

        let output = Command::new("git")
            .args(&args)
            .output()
            .await
            .map_err(|source| SyncError::Io {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SyncError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            "git pull output: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(SyncOutcome::Updated)
    }
}
