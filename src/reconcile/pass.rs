//! A single reconciliation pass
//!
//! Sync, scan, diff against the store, apply, resolve upstream versions and
//! fire hooks. Only scan and store failures abort; everything else is
//! recorded as a [`PassWarning`] and the pass carries on.

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream};
use tracing::{debug, info, warn};

use crate::distro::scanner::DistributionScanner;
use crate::distro::types::Snapshot;
use crate::reconcile::error::{HookError, HookEvent, PassWarning, ReconcileError};
use crate::reconcile::hooks::{LoggingHooks, ReconcileHooks};
use crate::reconcile::plan::{PackageChange, ReconcilePlan, plan};
use crate::reconcile::report::PassReport;
use crate::store::state::StateStore;
use crate::sync::{RepositorySync, SyncOutcome};
use crate::upstream::resolver::{Resolution, UpstreamRepository, UpstreamResolver, resolve_upstream};

/// Default number of upstream lookups in flight at once
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Upper bound on concurrent upstream lookups
    pub resolve_concurrency: usize,
    /// Fire the upstream hook for sources first recorded in this pass
    pub announce_new_sources: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            announce_new_sources: true,
        }
    }
}

/// Reconciles one distribution tree into one store
pub struct Reconciler<S: StateStore> {
    store: Arc<S>,
    scanner: Arc<dyn DistributionScanner>,
    root: PathBuf,
    resolver: Option<Arc<dyn UpstreamResolver>>,
    sync: Option<Box<dyn RepositorySync>>,
    hooks: Arc<dyn ReconcileHooks>,
    options: ReconcileOptions,
}

impl<S: StateStore> Reconciler<S> {
    pub fn new(
        store: Arc<S>,
        scanner: impl DistributionScanner + 'static,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            scanner: Arc::new(scanner),
            root: root.into(),
            resolver: None,
            sync: None,
            hooks: Arc::new(LoggingHooks),
            options: ReconcileOptions::default(),
        }
    }

    /// Resolve upstream versions against this resolver's repository
    pub fn with_resolver(mut self, resolver: Arc<dyn UpstreamResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Refresh the tree before scanning it
    pub fn with_sync(mut self, sync: impl RepositorySync + 'static) -> Self {
        self.sync = Some(Box::new(sync));
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ReconcileHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one full pass
    ///
    /// # Returns
    /// * `Ok(PassReport)` - The pass completed, possibly with warnings
    /// * `Err(ReconcileError)` - The scan or a store operation failed
    pub async fn run_pass(&self) -> Result<PassReport, ReconcileError> {
        info!("Starting reconciliation pass for {}", self.root.display());
        let mut report = PassReport::default();

        self.sync_tree(&mut report).await;

        let snapshot = self.scan().await?;
        info!(
            "Scanned {} sources and {} packages ({} skipped)",
            snapshot.sources.len(),
            snapshot.packages.len(),
            snapshot.skipped.len()
        );

        let stored = self.store.load_state()?;
        let plan = plan(&snapshot, &stored);
        if plan.is_empty() {
            debug!("Stored state already matches the distribution tree");
        }

        self.apply_removals(&plan, &mut report).await?;
        self.apply_changes(&plan, &mut report).await?;

        if let Some(resolver) = &self.resolver {
            self.resolve_upstream_versions(resolver.as_ref(), &snapshot, &plan, &mut report)
                .await?;
        }

        report.skipped = snapshot.skipped;

        info!(
            "Reconciliation pass finished with status {}: {:?}",
            report.status(),
            report.counts
        );
        Ok(report)
    }

    /// Scanning reads and parses the whole tree, so it runs off the async workers
    async fn scan(&self) -> Result<Snapshot, ReconcileError> {
        let scanner = Arc::clone(&self.scanner);
        let root = self.root.clone();
        let snapshot = tokio::task::spawn_blocking(move || scanner.scan(&root)).await??;
        Ok(snapshot)
    }

    async fn sync_tree(&self, report: &mut PassReport) {
        let Some(sync) = &self.sync else {
            return;
        };

        match sync.sync(&self.root).await {
            Ok(SyncOutcome::Updated) => info!("Distribution tree updated"),
            Ok(SyncOutcome::NotARepository) => {
                debug!("Distribution tree is not a repository, scanning as is")
            }
            Err(e) => {
                warn!("Repository sync failed, continuing with existing tree: {}", e);
                report.warn(e);
            }
        }
    }

    async fn apply_removals(
        &self,
        plan: &ReconcilePlan,
        report: &mut PassReport,
    ) -> Result<(), ReconcileError> {
        for name in &plan.removed_sources {
            fire_hook(
                report,
                HookEvent::SourceRemoved,
                name,
                self.hooks.source_removed(name),
            )
            .await;
            let cascaded = self.store.remove_source(name)?;
            debug!("Removed source {} with {} package(s)", name, cascaded);
            report.counts.sources_removed += 1;
        }

        for record in &plan.removed_packages {
            fire_hook(
                report,
                HookEvent::PackageRemoved,
                &record.name,
                self.hooks
                    .package_removed(&record.name, &record.source_name),
            )
            .await;
            self.store.remove_package(&record.name)?;
            report.counts.packages_removed += 1;
        }

        Ok(())
    }

    async fn apply_changes(
        &self,
        plan: &ReconcilePlan,
        report: &mut PassReport,
    ) -> Result<(), ReconcileError> {
        // Sources first so every package insert finds its owner
        for change in &plan.source_changes {
            self.store.upsert_source(&change.source)?;
            if change.is_new() {
                debug!("Recorded new source {}", change.source.name);
                report.counts.sources_added += 1;
            } else {
                report.counts.sources_updated += 1;
            }
        }

        for change in &plan.package_changes {
            match change {
                PackageChange::Added(package) => {
                    fire_hook(
                        report,
                        HookEvent::PackageAdded,
                        &package.name,
                        self.hooks.package_added(&package.name, &package.source),
                    )
                    .await;
                    report.counts.packages_added += 1;
                }
                PackageChange::Updated {
                    package,
                    previous_version,
                } => {
                    if let Some(previous) = previous_version {
                        fire_hook(
                            report,
                            HookEvent::LocalVersionUpdated,
                            &package.name,
                            self.hooks
                                .local_version_updated(&package.name, previous, &package.version),
                        )
                        .await;
                    }
                    report.counts.packages_updated += 1;
                }
            }
            self.store.upsert_package(change.package())?;
        }

        Ok(())
    }

    async fn resolve_upstream_versions(
        &self,
        resolver: &dyn UpstreamResolver,
        snapshot: &Snapshot,
        plan: &ReconcilePlan,
        report: &mut PassReport,
    ) -> Result<(), ReconcileError> {
        let repository = resolver.repository();
        // Every scanned source, including tool sources that own no package
        let sources: Vec<&str> = snapshot.sources.keys().map(String::as_str).collect();
        let new_sources: HashSet<&str> = plan
            .source_changes
            .iter()
            .filter(|change| change.is_new())
            .map(|change| change.source.name.as_str())
            .collect();

        info!(
            "Resolving {} upstream versions from {}",
            sources.len(),
            repository
        );

        // Lookups overlap; results are applied one at a time in scan order
        let mut lookups = stream::iter(sources)
            .map(|name| async move { (name, resolve_upstream(resolver, name).await) })
            .buffered(self.options.resolve_concurrency.max(1));

        while let Some((name, resolution)) = lookups.next().await {
            match resolution {
                Resolution::Found(version) => {
                    let announce =
                        self.options.announce_new_sources || !new_sources.contains(name);
                    self.apply_upstream(name, &version, repository, announce, report)
                        .await?;
                }
                Resolution::NotFound => report.unresolved.push(name.to_string()),
                Resolution::Failed(error) => {
                    report.unresolved.push(name.to_string());
                    report.warn(PassWarning::Resolution {
                        source_name: name.to_string(),
                        error,
                    });
                }
            }
        }

        Ok(())
    }

    async fn apply_upstream(
        &self,
        source: &str,
        version: &str,
        repository: UpstreamRepository,
        announce: bool,
        report: &mut PassReport,
    ) -> Result<(), ReconcileError> {
        let changed = self
            .store
            .source(source)?
            .is_none_or(|record| record.upstream_differs(version, repository.as_str()));

        if !changed {
            // Packages added since the value was recorded only need a copy of it
            let pending = self
                .store
                .packages_by_source(source)?
                .iter()
                .any(|record| record.upstream_differs(version, repository.as_str()));
            if pending {
                self.store
                    .record_upstream(source, version, repository.as_str())?;
                debug!(
                    "Copied upstream version {} of {} to newly added packages",
                    version, source
                );
            }
            return Ok(());
        }

        if announce {
            fire_hook(
                report,
                HookEvent::UpstreamVersionUpdated,
                source,
                self.hooks
                    .upstream_version_updated(source, version, repository),
            )
            .await;
        } else {
            debug!(
                "Not announcing upstream version {} of new source {}",
                version, source
            );
        }

        let updated = self
            .store
            .record_upstream(source, version, repository.as_str())?;
        debug!(
            "Recorded upstream version {} for {} and {} of its packages",
            version, source, updated
        );
        report.counts.upstream_updates += 1;
        Ok(())
    }
}

/// Await a hook, turning errors and panics into pass warnings
async fn fire_hook(
    report: &mut PassReport,
    event: HookEvent,
    subject: &str,
    call: impl Future<Output = Result<(), HookError>>,
) {
    let result = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HookError::Panicked(panic_message(payload.as_ref()))),
    };

    if let Err(error) = result {
        warn!("{} hook for {} failed: {}", event, subject, error);
        report.warn(PassWarning::Hook {
            event,
            subject: subject.to_string(),
            error,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::distro::scanner::ScanError;
    use crate::distro::types::{Package, Source};
    use crate::reconcile::report::PassStatus;
    use crate::store::{Store, StoredState};
    use crate::sync::{MockRepositorySync, SyncError};
    use crate::upstream::resolver::{MockUpstreamResolver, ResolveError};

    /// Scanner returning whatever snapshot the test put in last
    #[derive(Clone, Default)]
    struct FixedScanner(Arc<Mutex<Option<Snapshot>>>);

    impl FixedScanner {
        fn set(&self, snapshot: Snapshot) {
            *self.0.lock().unwrap() = Some(snapshot);
        }
    }

    impl DistributionScanner for FixedScanner {
        fn scan(&self, root: &Path) -> Result<Snapshot, ScanError> {
            self.0
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ScanError::MissingRoot(root.to_path_buf()))
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
        panic_on_add: bool,
    }

    impl RecordingHooks {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl ReconcileHooks for RecordingHooks {
        async fn package_added(&self, package: &str, source: &str) -> Result<(), HookError> {
            if self.panic_on_add {
                panic!("hook exploded");
            }
            self.push(format!("package_added {package} {source}"));
            Ok(())
        }

        async fn package_removed(&self, package: &str, source: &str) -> Result<(), HookError> {
            self.push(format!("package_removed {package} {source}"));
            Ok(())
        }

        async fn source_removed(&self, source: &str) -> Result<(), HookError> {
            self.push(format!("source_removed {source}"));
            Ok(())
        }

        async fn local_version_updated(
            &self,
            package: &str,
            old_version: &str,
            new_version: &str,
        ) -> Result<(), HookError> {
            self.push(format!(
                "local_version_updated {package} {old_version} {new_version}"
            ));
            Ok(())
        }

        async fn upstream_version_updated(
            &self,
            source: &str,
            version: &str,
            repository: UpstreamRepository,
        ) -> Result<(), HookError> {
            self.push(format!("upstream_version_updated {source} {version} {repository}"));
            Ok(())
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        store: Arc<Store>,
        scanner: FixedScanner,
        hooks: Arc<RecordingHooks>,
    }

    fn fixture(hooks: RecordingHooks) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(Store::open(&temp_dir.path().join("state.db")).unwrap());
        Fixture {
            _temp_dir: temp_dir,
            store,
            scanner: FixedScanner::default(),
            hooks: Arc::new(hooks),
        }
    }

    impl Fixture {
        fn reconciler(&self) -> Reconciler<Store> {
            Reconciler::new(Arc::clone(&self.store), self.scanner.clone(), "/distro")
                .with_hooks(self.hooks.clone())
        }
    }

    fn foo(version: &str) -> Snapshot {
        Snapshot::new()
            .with_source(Source::new("foo", version))
            .with_package(Package::new("foo-core", "foo", version))
    }

    fn resolver(versions: &'static [(&'static str, &'static str)]) -> MockUpstreamResolver {
        let mut resolver = MockUpstreamResolver::new();
        resolver
            .expect_repository()
            .return_const(UpstreamRepository::Nixos);
        resolver.expect_resolve().returning(move |name| {
            if name == "broken" {
                return Err(ResolveError::InvalidResponse("boom".to_string()));
            }
            Ok(versions
                .iter()
                .find(|(source, _)| *source == name)
                .map(|(_, version)| version.to_string()))
        });
        resolver
    }

    #[tokio::test]
    async fn first_pass_adds_then_bump_updates_local_version() {
        let f = fixture(RecordingHooks::default());
        let reconciler = f.reconciler();

        f.scanner.set(foo("v1.2"));
        let report = reconciler.run_pass().await.unwrap();
        assert_eq!(report.counts.sources_added, 1);
        assert_eq!(report.counts.packages_added, 1);

        f.scanner.set(foo("v1.3"));
        let report = reconciler.run_pass().await.unwrap();
        assert_eq!(report.status(), PassStatus::Success);
        assert_eq!(report.counts.sources_updated, 1);

        assert_eq!(
            f.hooks.events(),
            vec![
                "package_added foo-core foo",
                "local_version_updated foo-core v1.2 v1.3",
            ]
        );
        assert_eq!(
            f.store.package("foo-core").unwrap().unwrap().local_version,
            "v1.3"
        );
    }

    #[tokio::test]
    async fn unchanged_tree_fires_no_hooks_on_second_pass() {
        let f = fixture(RecordingHooks::default());
        let reconciler = f.reconciler();
        f.scanner.set(foo("v1.2"));

        reconciler.run_pass().await.unwrap();
        let state_after_first = f.store.load_state().unwrap();
        let events_after_first = f.hooks.events().len();

        let report = reconciler.run_pass().await.unwrap();

        assert!(report.counts.is_empty());
        assert_eq!(f.hooks.events().len(), events_after_first);
        assert_eq!(f.store.load_state().unwrap(), state_after_first);
    }

    #[tokio::test]
    async fn removed_source_fires_only_source_removed() {
        let f = fixture(RecordingHooks::default());
        let reconciler = f.reconciler();
        f.scanner.set(
            foo("v1.2")
                .with_package(Package::new("foo-doc", "foo", "v1.2"))
                .with_source(Source::new("bar", "1.0"))
                .with_package(Package::new("bar", "bar", "1.0")),
        );
        reconciler.run_pass().await.unwrap();

        f.scanner.set(
            Snapshot::new()
                .with_source(Source::new("bar", "1.0"))
                .with_package(Package::new("bar", "bar", "1.0")),
        );
        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.counts.sources_removed, 1);
        assert_eq!(report.counts.packages_removed, 0);
        assert_eq!(f.hooks.events().last().unwrap(), "source_removed foo");
        assert!(f.store.package("foo-core").unwrap().is_none());
        assert!(f.store.package("foo-doc").unwrap().is_none());
    }

    #[tokio::test]
    async fn scan_failure_aborts_before_touching_store() {
        let f = fixture(RecordingHooks::default());

        let result = f.reconciler().run_pass().await;

        assert!(matches!(result, Err(ReconcileError::Scan(_))));
        assert_eq!(f.store.load_state().unwrap(), StoredState::default());
    }

    struct PanickingScanner;

    impl DistributionScanner for PanickingScanner {
        fn scan(&self, _root: &Path) -> Result<Snapshot, ScanError> {
            panic!("scanner exploded");
        }
    }

    #[tokio::test]
    async fn panicking_scan_aborts_pass_as_scan_task_failure() {
        let f = fixture(RecordingHooks::default());

        let result = Reconciler::new(Arc::clone(&f.store), PanickingScanner, "/distro")
            .run_pass()
            .await;

        assert!(matches!(result, Err(ReconcileError::ScanTask(ref e)) if e.is_panic()));
        assert_eq!(f.store.load_state().unwrap(), StoredState::default());
    }

    #[tokio::test]
    async fn panicking_hook_is_recorded_and_pass_continues() {
        let f = fixture(RecordingHooks {
            panic_on_add: true,
            ..Default::default()
        });
        f.scanner.set(foo("v1.2"));

        let report = f.reconciler().run_pass().await.unwrap();

        assert_eq!(report.status(), PassStatus::Partial);
        assert!(matches!(
            report.warnings.as_slice(),
            [PassWarning::Hook {
                event: HookEvent::PackageAdded,
                error: HookError::Panicked(message),
                ..
            }] if message == "hook exploded"
        ));
        assert!(f.store.package("foo-core").unwrap().is_some());
    }

    #[tokio::test]
    async fn sync_failure_is_a_warning() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("v1.2"));
        let mut sync = MockRepositorySync::new();
        sync.expect_sync().times(1).returning(|_| {
            Err(SyncError::Io {
                command: "git pull".to_string(),
                source: std::io::Error::other("network down"),
            })
        });

        let report = f.reconciler().with_sync(sync).run_pass().await.unwrap();

        assert_eq!(report.status(), PassStatus::Partial);
        assert!(matches!(report.warnings[0], PassWarning::Sync(_)));
        assert_eq!(report.counts.packages_added, 1);
    }

    #[tokio::test]
    async fn upstream_failure_for_one_source_leaves_others_updated() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(
            foo("1.2")
                .with_source(Source::new("broken", "1.0"))
                .with_package(Package::new("broken", "broken", "1.0")),
        );
        let reconciler = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3")])));

        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.status(), PassStatus::Partial);
        assert_eq!(report.unresolved, vec!["broken"]);
        assert_eq!(report.counts.upstream_updates, 1);
        let foo_core = f.store.package("foo-core").unwrap().unwrap();
        assert_eq!(foo_core.upstream_version.as_deref(), Some("1.3"));
        assert_eq!(foo_core.upstream_repository.as_deref(), Some("nixos"));
        assert!(f.store.package("broken").unwrap().unwrap().upstream_version.is_none());
        assert!(
            f.hooks
                .events()
                .contains(&"upstream_version_updated foo 1.3 nixos".to_string())
        );
    }

    #[tokio::test]
    async fn upstream_hook_fires_only_when_recorded_value_changes() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("1.2"));
        let reconciler = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3")])));

        reconciler.run_pass().await.unwrap();
        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.counts.upstream_updates, 0);
        let upstream_events = f
            .hooks
            .events()
            .into_iter()
            .filter(|e| e.starts_with("upstream_version_updated"))
            .count();
        assert_eq!(upstream_events, 1);
    }

    #[tokio::test]
    async fn package_added_to_resolved_source_does_not_reannounce_upstream() {
        let f = fixture(RecordingHooks::default());
        let reconciler = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3")])));
        f.scanner.set(foo("1.2"));
        reconciler.run_pass().await.unwrap();

        f.scanner
            .set(foo("1.2").with_package(Package::new("foo-doc", "foo", "1.2")));
        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.counts.upstream_updates, 0);
        let upstream_events: Vec<_> = f
            .hooks
            .events()
            .into_iter()
            .filter(|e| e.starts_with("upstream_version_updated"))
            .collect();
        assert_eq!(upstream_events, vec!["upstream_version_updated foo 1.3 nixos"]);
        let foo_doc = f.store.package("foo-doc").unwrap().unwrap();
        assert_eq!(foo_doc.upstream_version.as_deref(), Some("1.3"));
        assert_eq!(foo_doc.upstream_repository.as_deref(), Some("nixos"));
    }

    #[tokio::test]
    async fn changed_upstream_is_announced_again() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("1.2"));
        f.reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3")])))
            .run_pass()
            .await
            .unwrap();

        let report = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.4")])))
            .run_pass()
            .await
            .unwrap();

        assert_eq!(report.counts.upstream_updates, 1);
        assert_eq!(
            f.hooks.events().last().unwrap(),
            "upstream_version_updated foo 1.4 nixos"
        );
        assert_eq!(
            f.store.source("foo").unwrap().unwrap().upstream_version.as_deref(),
            Some("1.4")
        );
    }

    #[tokio::test]
    async fn source_without_packages_is_resolved_and_announced() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("1.2").with_source(Source::new("gcc", "13.2")));
        let reconciler = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3"), ("gcc", "14.1")])));

        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.counts.upstream_updates, 2);
        assert!(
            f.hooks
                .events()
                .contains(&"upstream_version_updated gcc 14.1 nixos".to_string())
        );
        assert_eq!(
            f.store.source("gcc").unwrap().unwrap().upstream_version.as_deref(),
            Some("14.1")
        );

        let report = reconciler.run_pass().await.unwrap();
        assert_eq!(report.counts.upstream_updates, 0);
    }

    #[tokio::test]
    async fn new_sources_can_be_recorded_silently() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("1.2"));
        let reconciler = f
            .reconciler()
            .with_resolver(Arc::new(resolver(&[("foo", "1.3")])))
            .with_options(ReconcileOptions {
                announce_new_sources: false,
                ..Default::default()
            });

        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.counts.upstream_updates, 1);
        assert_eq!(f.hooks.events(), vec!["package_added foo-core foo"]);
        assert_eq!(
            f.store
                .package("foo-core")
                .unwrap()
                .unwrap()
                .upstream_version
                .as_deref(),
            Some("1.3")
        );
    }

    #[tokio::test]
    async fn unknown_upstream_is_unresolved_without_warning() {
        let f = fixture(RecordingHooks::default());
        f.scanner.set(foo("1.2"));
        let reconciler = f.reconciler().with_resolver(Arc::new(resolver(&[])));

        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report.status(), PassStatus::Success);
        assert_eq!(report.unresolved, vec!["foo"]);
    }
}
