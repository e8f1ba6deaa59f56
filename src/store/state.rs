//! Store trait and record types

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;
use serde::Serialize;

use crate::distro::types::{Package, PackageMetadata, Source};
use crate::store::error::StoreError;

/// Last recorded state of a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub name: String,
    pub local_version: String,
    pub upstream_version: Option<String>,
    pub upstream_repository: Option<String>,
}

impl SourceRecord {
    /// Whether the recorded upstream differs from the given one
    pub fn upstream_differs(&self, version: &str, repository: &str) -> bool {
        self.upstream_version.as_deref() != Some(version)
            || self.upstream_repository.as_deref() != Some(repository)
    }
}

/// Last recorded state of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub source_name: String,
    pub local_version: String,
    pub maintainer: Option<String>,
    pub upstream_version: Option<String>,
    pub upstream_repository: Option<String>,
    pub metadata: PackageMetadata,
}

impl PackageRecord {
    /// Whether the scanned package carries the same presence data as this
    /// record. Upstream fields are not part of the comparison.
    pub fn matches(&self, package: &Package) -> bool {
        self.name == package.name
            && self.source_name == package.source
            && self.local_version == package.version
            && self.maintainer == package.maintainer
            && self.metadata == package.metadata
    }

    /// Whether the recorded upstream differs from the given one
    pub fn upstream_differs(&self, version: &str, repository: &str) -> bool {
        self.upstream_version.as_deref() != Some(version)
            || self.upstream_repository.as_deref() != Some(repository)
    }
}

/// Everything the store holds, keyed by name in name order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    pub sources: IndexMap<String, SourceRecord>,
    pub packages: IndexMap<String, PackageRecord>,
}

/// Trait for reading and writing reconciliation state
///
/// Every write is atomic on its own: a crash between two writes never leaves
/// a package pointing at a source that is not recorded.
#[cfg_attr(test, automock)]
pub trait StateStore: Send + Sync + 'static {
    /// Load all recorded sources and packages
    fn load_state(&self) -> Result<StoredState, StoreError>;

    /// Insert a source or update its local version
    fn upsert_source(&self, source: &Source) -> Result<(), StoreError>;

    /// Delete a source together with all packages it owns
    ///
    /// Returns the number of packages deleted with it.
    fn remove_source(&self, name: &str) -> Result<usize, StoreError>;

    /// Insert a package or update its presence data, keeping upstream fields
    ///
    /// Fails with [`StoreError::MissingSource`] if the owning source is not
    /// recorded.
    fn upsert_package(&self, package: &Package) -> Result<(), StoreError>;

    /// Delete a package, returning whether it existed
    fn remove_package(&self, name: &str) -> Result<bool, StoreError>;

    /// Record the upstream version of a source and of every package it owns
    ///
    /// Returns the number of packages updated.
    fn record_upstream(
        &self,
        source_name: &str,
        version: &str,
        repository: &str,
    ) -> Result<usize, StoreError>;

    /// Get a single source by name
    fn source(&self, name: &str) -> Result<Option<SourceRecord>, StoreError>;

    /// Get a single package by name
    fn package(&self, name: &str) -> Result<Option<PackageRecord>, StoreError>;

    /// Get all packages owned by a source
    fn packages_by_source(&self, source_name: &str) -> Result<Vec<PackageRecord>, StoreError>;

    /// Find sources whose name contains the search term
    fn search_sources(&self, term: &str) -> Result<Vec<SourceRecord>, StoreError>;

    /// Get packages with no maintainer recorded
    fn packages_missing_maintainer(&self) -> Result<Vec<PackageRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> PackageRecord {
        PackageRecord {
            name: "foo-core".to_string(),
            source_name: "foo".to_string(),
            local_version: "1.2".to_string(),
            maintainer: Some("a@x.com".to_string()),
            upstream_version: Some("1.3".to_string()),
            upstream_repository: Some("nixos".to_string()),
            metadata: PackageMetadata::default(),
        }
    }

    #[test]
    fn matches_ignores_upstream_fields() {
        let package = Package::new("foo-core", "foo", "1.2").with_maintainer("a@x.com");
        assert!(record().matches(&package));
    }

    #[rstest]
    #[case(Package::new("foo-core", "foo", "1.3").with_maintainer("a@x.com"))]
    #[case(Package::new("foo-core", "bar", "1.2").with_maintainer("a@x.com"))]
    #[case(Package::new("foo-core", "foo", "1.2"))]
    fn matches_detects_presence_changes(#[case] package: Package) {
        assert!(!record().matches(&package));
    }

    #[rstest]
    #[case("1.3", "nixos", false)]
    #[case("1.4", "nixos", true)]
    #[case("1.3", "other", true)]
    fn upstream_differs_compares_version_and_repository(
        #[case] version: &str,
        #[case] repository: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(record().upstream_differs(version, repository), expected);

        let source = SourceRecord {
            name: "foo".to_string(),
            local_version: "1.2".to_string(),
            upstream_version: Some("1.3".to_string()),
            upstream_repository: Some("nixos".to_string()),
        };
        assert_eq!(source.upstream_differs(version, repository), expected);
    }

    #[test]
    fn source_without_upstream_always_differs() {
        let source = SourceRecord {
            name: "foo".to_string(),
            local_version: "1.2".to_string(),
            upstream_version: None,
            upstream_repository: None,
        };
        assert!(source.upstream_differs("1.2", "nixos"));
    }
}
