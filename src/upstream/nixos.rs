//! NixOS channel package index resolver
//!
//! The channel publishes one `packages.json` describing every package
//! attribute. It is large, so it is fetched once per resolver, optionally
//! cached on disk, and shared by all lookups.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::upstream::resolver::{ResolveError, UpstreamRepository, UpstreamResolver};
use crate::version::compare::max_version;

pub const DEFAULT_NIXOS_INDEX_URL: &str =
    "https://channels.nixos.org/nixos-unstable/packages.json.br";

/// Default maximum age of the cached index (24 hours)
pub const DEFAULT_INDEX_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// `packages.json` layout; only the fields used for lookups are read
#[derive(Debug, Deserialize)]
struct PackagesFile {
    packages: HashMap<String, PackageEntry>,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    #[serde(default)]
    pname: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Version lookup table built from the channel index
#[derive(Debug, Default)]
pub struct NixosIndex {
    by_attribute: HashMap<String, String>,
    by_pname: HashMap<String, Vec<String>>,
}

impl NixosIndex {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let file: PackagesFile = serde_json::from_slice(bytes)?;
        let mut index = NixosIndex::default();

        for (attribute, entry) in file.packages {
            let Some(version) = entry.version.filter(|v| !v.is_empty()) else {
                continue;
            };
            if let Some(pname) = entry.pname {
                index
                    .by_pname
                    .entry(pname)
                    .or_default()
                    .push(version.clone());
            }
            index.by_attribute.insert(attribute, version);
        }

        Ok(index)
    }

    /// Exact attribute match first, otherwise the greatest version among
    /// entries sharing the package name
    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(version) = self.by_attribute.get(name) {
            return Some(version.clone());
        }

        let candidates = self.by_pname.get(name)?;
        max_version(candidates.iter().map(String::as_str))
            .or_else(|| candidates.first().map(String::as_str))
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.by_attribute.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_attribute.is_empty()
    }
}

/// Resolver backed by the NixOS channel package index
pub struct NixosResolver {
    client: Client,
    index_url: String,
    cache_path: Option<PathBuf>,
    max_age: Duration,
    index: OnceCell<Result<Arc<NixosIndex>, String>>,
}

impl Default for NixosResolver {
    fn default() -> Self {
        Self::new(DEFAULT_NIXOS_INDEX_URL.to_string())
    }
}

impl NixosResolver {
    pub fn new(index_url: String) -> Self {
        Self {
            client: Client::new(),
            index_url,
            cache_path: None,
            max_age: DEFAULT_INDEX_MAX_AGE,
            index: OnceCell::new(),
        }
    }

    /// Keep a copy of the downloaded index at `path`, reusing it while it is
    /// younger than `max_age`
    pub fn with_cache(mut self, path: PathBuf, max_age: Duration) -> Self {
        self.cache_path = Some(path);
        self.max_age = max_age;
        self
    }

    async fn index(&self) -> Result<Arc<NixosIndex>, ResolveError> {
        self.index
            .get_or_init(|| async {
                self.load_index()
                    .await
                    .map(Arc::new)
                    .inspect_err(|e| warn!("Failed to load NixOS package index: {}", e))
                    .map_err(|e| e.to_string())
            })
            .await
            .clone()
            .map_err(ResolveError::IndexUnavailable)
    }

    async fn load_index(&self) -> Result<NixosIndex, ResolveError> {
        if let Some(cache_path) = &self.cache_path {
            if is_fresh(cache_path, self.max_age) {
                info!("Using cached NixOS package index at {}", cache_path.display());
                let bytes = tokio::fs::read(cache_path)
                    .await
                    .map_err(|e| io_err(cache_path, e))?;
                return parse_index(&bytes);
            }
        }

        let bytes = match self.download().await {
            Ok(bytes) => bytes,
            Err(e) => {
                // A stale copy still beats no upstream data at all
                if let Some(cache_path) = self.cache_path.as_ref().filter(|p| p.is_file()) {
                    warn!(
                        "Download of NixOS package index failed ({}), using stale cache at {}",
                        e,
                        cache_path.display()
                    );
                    let bytes = tokio::fs::read(cache_path)
                        .await
                        .map_err(|e| io_err(cache_path, e))?;
                    return parse_index(&bytes);
                }
                return Err(e);
            }
        };

        if let Some(cache_path) = &self.cache_path {
            if let Err(e) = write_cache(cache_path, &bytes).await {
                warn!(
                    "Failed to cache NixOS package index at {}: {}",
                    cache_path.display(),
                    e
                );
            }
        }

        parse_index(&bytes)
    }

    async fn download(&self) -> Result<Vec<u8>, ResolveError> {
        info!("Downloading NixOS package index from {}", self.index_url);

        let response = self.client.get(&self.index_url).send().await?;

        if !response.status().is_success() {
            return Err(ResolveError::InvalidResponse(format!(
                "NixOS index returned status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes of NixOS package index", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UpstreamResolver for NixosResolver {
    fn repository(&self) -> UpstreamRepository {
        UpstreamRepository::Nixos
    }

    async fn resolve(&self, source_name: &str) -> Result<Option<String>, ResolveError> {
        let index = self.index().await?;
        Ok(index.lookup(source_name))
    }
}

fn parse_index(bytes: &[u8]) -> Result<NixosIndex, ResolveError> {
    let index = NixosIndex::from_json(bytes)
        .map_err(|e| ResolveError::InvalidResponse(format!("malformed NixOS index: {e}")))?;
    info!("Loaded NixOS package index with {} attributes", index.len());
    Ok(index)
}

fn is_fresh(path: &Path, max_age: Duration) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return true;
    };
    Utc::now() - modified < max_age
}

async fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), ResolveError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| io_err(path, e))
}

fn io_err(path: &Path, source: std::io::Error) -> ResolveError {
    ResolveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
