//! Common types for distribution snapshots

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

/// A buildable unit of the distribution, carrying one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    pub version: String,
}

impl Source {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Descriptive package metadata, stored alongside the package but never diffed
/// for hook purposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub homepage_url: Option<String>,
    pub license: Option<String>,
    /// Comma-separated category list
    pub category: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// A unit produced by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub name: String,
    /// Name of the owning source
    pub source: String,
    pub version: String,
    /// Free text; may or may not contain an e-mail address
    pub maintainer: Option<String>,
    pub metadata: PackageMetadata,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            version: version.into(),
            maintainer: None,
            metadata: PackageMetadata::default(),
        }
    }

    pub fn with_maintainer(mut self, maintainer: impl Into<String>) -> Self {
        self.maintainer = Some(maintainer.into());
        self
    }
}

/// Kind of definition a skipped entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Source,
    Tool,
    Package,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Source => "source",
            EntryKind::Tool => "tool",
            EntryKind::Package => "package",
        }
    }
}

/// A definition that was ignored because it could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub file: PathBuf,
    pub kind: EntryKind,
    pub name: Option<String>,
    pub reason: String,
}

/// The sources and packages observed in one scan, keyed by name in
/// declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub sources: IndexMap<String, Source>,
    pub packages: IndexMap<String, Package>,
    pub skipped: Vec<SkippedEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.insert(source.name.clone(), source);
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.insert(package.name.clone(), package);
        self
    }

    /// Packages owned by the given source, in declaration order
    pub fn packages_of<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Package> + 'a {
        self.packages.values().filter(move |p| p.source == source)
    }
}
