//! Resolver trait for fetching upstream versions

use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Known upstream repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamRepository {
    /// NixOS channel package index
    Nixos,
}

impl UpstreamRepository {
    /// Returns the identifier recorded alongside upstream versions
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamRepository::Nixos => "nixos",
        }
    }
}

impl std::str::FromStr for UpstreamRepository {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nixos" => Ok(UpstreamRepository::Nixos),
            other => Err(format!("unknown upstream repository: {other}")),
        }
    }
}

impl std::fmt::Display for UpstreamRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Upstream index unavailable: {0}")]
    IndexUnavailable(String),
}

/// Trait for looking up the upstream version of a source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Returns the repository this resolver queries
    fn repository(&self) -> UpstreamRepository;

    /// Looks up the best version match for a source name
    ///
    /// # Returns
    /// * `Ok(Some(version))` - The repository knows the source
    /// * `Ok(None)` - The repository has no entry for it
    /// * `Err(ResolveError)` - The lookup itself failed
    async fn resolve(&self, source_name: &str) -> Result<Option<String>, ResolveError>;
}

/// Outcome of one upstream lookup
#[derive(Debug)]
pub enum Resolution {
    Found(String),
    NotFound,
    /// The lookup failed; treated as not found
    Failed(ResolveError),
}

impl Resolution {
    pub fn version(&self) -> Option<&str> {
        match self {
            Resolution::Found(version) => Some(version),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Resolve a source, folding lookup failures into [`Resolution::Failed`]
pub async fn resolve_upstream(resolver: &dyn UpstreamResolver, source_name: &str) -> Resolution {
    let repository = resolver.repository();
    match resolver.resolve(source_name).await {
        Ok(Some(version)) => {
            debug!("{} upstream version in {}: {}", source_name, repository, version);
            Resolution::Found(version)
        }
        Ok(None) => {
            debug!("{} not found in {}", source_name, repository);
            Resolution::NotFound
        }
        Err(e) => {
            warn!(
                "Failed to resolve upstream version of {} in {}: {}",
                source_name, repository, e
            );
            Resolution::Failed(e)
        }
    }
}
