//! Scanner for xbstrap distribution trees
//!
//! An xbstrap tree is described by a root `bootstrap.yml` that may pull in
//! further files through `imports`. Sources are declared in a top-level
//! `sources` list or inline as a `source:` block of a tool or package, in
//! which case the source takes the owner's name.
//!
//! ```yaml
//! imports:
//!   - file: bootstrap.d/libs.y4.yml
//! sources:
//!   - name: foo
//!     version: '1.2'
//! packages:
//!   - name: foo-core
//!     from_source: foo
//!     metadata:
//!       maintainer: 'Jane Doe <jane@example.org>'
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::distro::scanner::{DistributionScanner, ScanError, io_err};
use crate::distro::types::{EntryKind, Package, PackageMetadata, SkippedEntry, Snapshot, Source};

pub const DEFAULT_ROOT_FILE: &str = "bootstrap.yml";

/// Version reported for rolling sources that do not pin a version
pub const ROLLING_VERSION: &str = "rolling";

/// Version reported for sources that declare no version at all
pub const UNVERSIONED: &str = "unversioned";

#[derive(Debug, Deserialize)]
struct ImportDef {
    file: String,
}

#[derive(Debug, Deserialize)]
struct SourceDef {
    name: String,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    rolling_version: bool,
}

#[derive(Debug, Deserialize)]
struct InlineSourceDef {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    rolling_version: bool,
}

#[derive(Debug, Deserialize)]
struct ToolDef {
    name: String,
    #[serde(default)]
    source: Option<InlineSourceDef>,
}

#[derive(Debug, Deserialize)]
struct PackageDef {
    name: String,
    #[serde(default)]
    from_source: Option<String>,
    #[serde(default)]
    source: Option<InlineSourceDef>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    metadata: MetadataDef,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataDef {
    #[serde(default)]
    maintainer: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    spdx: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<MetadataDef> for PackageMetadata {
    fn from(def: MetadataDef) -> Self {
        Self {
            homepage_url: def.website,
            license: def.spdx,
            category: (!def.categories.is_empty()).then(|| def.categories.join(", ")),
            summary: def.summary,
            description: def.description,
        }
    }
}

/// Raw entries gathered from every file of the tree before interpretation
#[derive(Default)]
struct RawTree {
    sources: Vec<(PathBuf, Value)>,
    tools: Vec<(PathBuf, Value)>,
    packages: Vec<(PathBuf, Value)>,
    loaded: HashSet<PathBuf>,
}

/// Scanner for xbstrap `bootstrap.yml` trees
#[derive(Debug, Clone)]
pub struct XbstrapScanner {
    root_file: String,
}

impl Default for XbstrapScanner {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_FILE)
    }
}

impl XbstrapScanner {
    pub fn new(root_file: impl Into<String>) -> Self {
        Self {
            root_file: root_file.into(),
        }
    }

    fn load_file(&self, path: &Path, is_root: bool, tree: &mut RawTree) -> Result<(), ScanError> {
        let key = path.canonicalize().map_err(|e| io_err(path, e))?;
        if !tree.loaded.insert(key) {
            warn!("{} is imported more than once, ignoring repeat", path.display());
            return Ok(());
        }

        debug!("Reading distribution metadata from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| ScanError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null if !is_root => return Ok(()),
            _ => {
                return Err(ScanError::InvalidStructure {
                    path: path.to_path_buf(),
                    message: "top level must be a mapping".to_string(),
                });
            }
        };

        for (key, target) in [
            ("sources", &mut tree.sources),
            ("tools", &mut tree.tools),
            ("packages", &mut tree.packages),
        ] {
            for entry in sequence(&mapping, key, path)? {
                target.push((path.to_path_buf(), entry));
            }
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in sequence(&mapping, "imports", path)? {
            let import: ImportDef =
                serde_yaml::from_value(entry).map_err(|e| ScanError::InvalidStructure {
                    path: path.to_path_buf(),
                    message: format!("invalid import entry: {e}"),
                })?;
            self.load_file(&base.join(import.file), false, tree)?;
        }

        Ok(())
    }
}

impl DistributionScanner for XbstrapScanner {
    fn scan(&self, root: &Path) -> Result<Snapshot, ScanError> {
        let root_file = root.join(&self.root_file);
        if !root_file.is_file() {
            return Err(ScanError::MissingRoot(root_file));
        }

        let mut tree = RawTree::default();
        self.load_file(&root_file, true, &mut tree)?;

        let snapshot = interpret(tree);
        info!(
            "Scanned {}: {} sources, {} packages, {} skipped entries",
            root.display(),
            snapshot.sources.len(),
            snapshot.packages.len(),
            snapshot.skipped.len()
        );
        Ok(snapshot)
    }
}

/// Read an optional list under `key`, rejecting anything that is not a list
fn sequence(mapping: &Mapping, key: &str, path: &Path) -> Result<Vec<Value>, ScanError> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(entries)) => Ok(entries.clone()),
        Some(_) => Err(ScanError::InvalidStructure {
            path: path.to_path_buf(),
            message: format!("`{key}` must be a list"),
        }),
    }
}

fn interpret(tree: RawTree) -> Snapshot {
    let mut snapshot = Snapshot::new();

    for (file, value) in tree.sources {
        let name = entry_name(&value);
        match serde_yaml::from_value::<SourceDef>(value) {
            Ok(def) => match source_version(def.version, def.rolling_version) {
                Ok(version) => register_source(&mut snapshot, &file, EntryKind::Source, def.name, version),
                Err(reason) => skip(&mut snapshot, file, EntryKind::Source, Some(def.name), reason),
            },
            Err(e) => skip(&mut snapshot, file, EntryKind::Source, name, e.to_string()),
        }
    }

    for (file, value) in tree.tools {
        let name = entry_name(&value);
        match serde_yaml::from_value::<ToolDef>(value) {
            Ok(ToolDef {
                name,
                source: Some(inline),
            }) => match source_version(inline.version, inline.rolling_version) {
                Ok(version) => register_source(&mut snapshot, &file, EntryKind::Tool, name, version),
                Err(reason) => skip(&mut snapshot, file, EntryKind::Tool, Some(name), reason),
            },
            Ok(_) => {}
            Err(e) => skip(&mut snapshot, file, EntryKind::Tool, name, e.to_string()),
        }
    }

    // Inline package sources must be known before any `from_source` is bound
    let mut package_defs = Vec::new();
    for (file, value) in tree.packages {
        let name = entry_name(&value);
        match serde_yaml::from_value::<PackageDef>(value) {
            Ok(mut def) => {
                if let Some(inline) = def.source.take() {
                    match source_version(inline.version, inline.rolling_version) {
                        Ok(version) => register_source(
                            &mut snapshot,
                            &file,
                            EntryKind::Package,
                            def.name.clone(),
                            version,
                        ),
                        Err(reason) => {
                            skip(&mut snapshot, file, EntryKind::Package, Some(def.name), reason);
                            continue;
                        }
                    }
                    def.from_source.get_or_insert_with(|| def.name.clone());
                }
                package_defs.push((file, def));
            }
            Err(e) => skip(&mut snapshot, file, EntryKind::Package, name, e.to_string()),
        }
    }

    for (file, def) in package_defs {
        bind_package(&mut snapshot, file, def);
    }

    snapshot
}

fn bind_package(snapshot: &mut Snapshot, file: PathBuf, def: PackageDef) {
    let Some(source_name) = def.from_source else {
        skip(
            snapshot,
            file,
            EntryKind::Package,
            Some(def.name),
            "package declares no source".to_string(),
        );
        return;
    };

    let Some(source) = snapshot.sources.get(&source_name) else {
        skip(
            snapshot,
            file,
            EntryKind::Package,
            Some(def.name),
            format!("package references undeclared source `{source_name}`"),
        );
        return;
    };

    if snapshot.packages.contains_key(&def.name) {
        skip(
            snapshot,
            file,
            EntryKind::Package,
            Some(def.name),
            "duplicate package name".to_string(),
        );
        return;
    }

    let version = match def.version.map(scalar_to_string).transpose() {
        Ok(Some(version)) => version,
        Ok(None) => source.version.clone(),
        Err(reason) => {
            skip(snapshot, file, EntryKind::Package, Some(def.name), reason);
            return;
        }
    };

    let maintainer = def
        .metadata
        .maintainer
        .clone()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let package = Package {
        name: def.name.clone(),
        source: source_name,
        version,
        maintainer,
        metadata: def.metadata.into(),
    };
    snapshot.packages.insert(def.name, package);
}

fn register_source(
    snapshot: &mut Snapshot,
    file: &Path,
    kind: EntryKind,
    name: String,
    version: String,
) {
    if name.trim().is_empty() {
        skip(snapshot, file.to_path_buf(), kind, None, "empty source name".to_string());
        return;
    }
    if snapshot.sources.contains_key(&name) {
        skip(
            snapshot,
            file.to_path_buf(),
            kind,
            Some(name),
            "duplicate source name".to_string(),
        );
        return;
    }
    snapshot.sources.insert(name.clone(), Source { name, version });
}

fn skip(snapshot: &mut Snapshot, file: PathBuf, kind: EntryKind, name: Option<String>, reason: String) {
    warn!(
        "Skipping malformed {} {} in {}: {}",
        kind.as_str(),
        name.as_deref().unwrap_or("<unnamed>"),
        file.display(),
        reason
    );
    snapshot.skipped.push(SkippedEntry {
        file,
        kind,
        name,
        reason,
    });
}

fn entry_name(value: &Value) -> Option<String> {
    value.get("name").and_then(Value::as_str).map(str::to_string)
}

fn source_version(version: Option<Value>, rolling: bool) -> Result<String, String> {
    match version.map(scalar_to_string).transpose()? {
        Some(version) => Ok(version),
        None if rolling => Ok(ROLLING_VERSION.to_string()),
        None => Ok(UNVERSIONED.to_string()),
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("version must be a non-empty string, got {other:?}")),
    }
}
