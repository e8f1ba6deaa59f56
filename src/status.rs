//! Freshness of recorded packages against their upstream versions

use serde::Serialize;

use crate::store::error::StoreError;
use crate::store::state::{PackageRecord, StateStore};
use crate::version::compare::{VersionComparison, compare};

/// Freshness of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFreshness {
    pub package: String,
    pub source: String,
    pub local_version: String,
    /// Latest known upstream version (if any was recorded)
    pub upstream_version: Option<String>,
    pub upstream_repository: Option<String>,
    pub maintainer: Option<String>,
    /// Local version compared against the upstream version
    pub status: VersionComparison,
}

impl PackageFreshness {
    pub fn is_outdated(&self) -> bool {
        self.status == VersionComparison::Older
    }
}

/// Classify a single package record
///
/// Without a recorded upstream version the status is
/// [`VersionComparison::Unknown`].
pub fn classify(record: &PackageRecord) -> PackageFreshness {
    let status = match &record.upstream_version {
        Some(upstream) => compare(&record.local_version, upstream),
        None => VersionComparison::Unknown,
    };

    PackageFreshness {
        package: record.name.clone(),
        source: record.source_name.clone(),
        local_version: record.local_version.clone(),
        upstream_version: record.upstream_version.clone(),
        upstream_repository: record.upstream_repository.clone(),
        maintainer: record.maintainer.clone(),
        status,
    }
}

/// Classify every recorded package, in name order
pub fn freshness_report<S: StateStore>(store: &S) -> Result<Vec<PackageFreshness>, StoreError> {
    let state = store.load_state()?;
    Ok(state.packages.values().map(classify).collect())
}
