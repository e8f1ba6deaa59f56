//! Diff between a scanned snapshot and the stored state

use std::collections::HashSet;

use crate::distro::types::{Package, Snapshot, Source};
use crate::store::state::{PackageRecord, StoredState};

/// Change to a source that is still present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChange {
    pub source: Source,
    /// `None` when the source was not recorded before
    pub previous_version: Option<String>,
}

impl SourceChange {
    pub fn is_new(&self) -> bool {
        self.previous_version.is_none()
    }
}

/// Change to a package that is present in the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageChange {
    Added(Package),
    Updated {
        package: Package,
        /// Set only when the local version changed
        previous_version: Option<String>,
    },
}

impl PackageChange {
    pub fn package(&self) -> &Package {
        match self {
            PackageChange::Added(package) => package,
            PackageChange::Updated { package, .. } => package,
        }
    }
}

/// Everything a pass has to apply, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Recorded sources missing from the scan; their packages go with them
    pub removed_sources: Vec<String>,
    /// Recorded packages missing from the scan whose source is still present
    pub removed_packages: Vec<PackageRecord>,
    pub source_changes: Vec<SourceChange>,
    pub package_changes: Vec<PackageChange>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.removed_sources.is_empty()
            && self.removed_packages.is_empty()
            && self.source_changes.is_empty()
            && self.package_changes.is_empty()
    }
}

/// Compute the changes that turn `stored` into `snapshot`
pub fn plan(snapshot: &Snapshot, stored: &StoredState) -> ReconcilePlan {
    let removed_sources: Vec<String> = stored
        .sources
        .keys()
        .filter(|name| !snapshot.sources.contains_key(*name))
        .cloned()
        .collect();
    let removed_set: HashSet<&str> = removed_sources.iter().map(String::as_str).collect();

    let removed_packages = stored
        .packages
        .values()
        .filter(|record| !snapshot.packages.contains_key(&record.name))
        .filter(|record| !removed_set.contains(record.source_name.as_str()))
        .cloned()
        .collect();

    let source_changes = snapshot
        .sources
        .values()
        .filter_map(|source| match stored.sources.get(&source.name) {
            None => Some(SourceChange {
                source: source.clone(),
                previous_version: None,
            }),
            Some(record) if record.local_version != source.version => Some(SourceChange {
                source: source.clone(),
                previous_version: Some(record.local_version.clone()),
            }),
            Some(_) => None,
        })
        .collect();

    let package_changes = snapshot
        .packages
        .values()
        .filter_map(|package| {
            // A row owned by a removed source disappears with it
            let record = stored
                .packages
                .get(&package.name)
                .filter(|record| !removed_set.contains(record.source_name.as_str()));

            match record {
                None => Some(PackageChange::Added(package.clone())),
                Some(record) if record.matches(package) => None,
                Some(record) => Some(PackageChange::Updated {
                    package: package.clone(),
                    previous_version: (record.local_version != package.version)
                        .then(|| record.local_version.clone()),
                }),
            }
        })
        .collect();

    ReconcilePlan {
        removed_sources,
        removed_packages,
        source_changes,
        package_changes,
    }
}
