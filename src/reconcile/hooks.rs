//! Observer hooks fired by a reconciliation pass

use async_trait::async_trait;
use tracing::info;

use crate::reconcile::error::HookError;
use crate::upstream::resolver::UpstreamRepository;

/// Observer of reconciliation events
///
/// Every method defaults to logging the event. A hook fires before the store
/// mutation it describes; a failing or panicking hook never stops the pass.
#[async_trait]
pub trait ReconcileHooks: Send + Sync {
    async fn package_added(&self, package: &str, source: &str) -> Result<(), HookError> {
        log_package_added(package, source);
        Ok(())
    }

    async fn package_removed(&self, package: &str, source: &str) -> Result<(), HookError> {
        log_package_removed(package, source);
        Ok(())
    }

    async fn source_removed(&self, source: &str) -> Result<(), HookError> {
        log_source_removed(source);
        Ok(())
    }

    async fn local_version_updated(
        &self,
        package: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<(), HookError> {
        log_local_version_updated(package, old_version, new_version);
        Ok(())
    }

    async fn upstream_version_updated(
        &self,
        source: &str,
        version: &str,
        repository: UpstreamRepository,
    ) -> Result<(), HookError> {
        log_upstream_version_updated(source, version, repository);
        Ok(())
    }
}

fn log_package_added(package: &str, source: &str) {
    info!("Package {} added (source {})", package, source);
}

fn log_package_removed(package: &str, source: &str) {
    info!("Package {} removed (source {})", package, source);
}

fn log_source_removed(source: &str) {
    info!("Source {} removed", source);
}

fn log_local_version_updated(package: &str, old_version: &str, new_version: &str) {
    info!(
        "Package {} local version updated: {} -> {}",
        package, old_version, new_version
    );
}

fn log_upstream_version_updated(source: &str, version: &str, repository: UpstreamRepository) {
    info!(
        "Source {} upstream version updated to {} ({})",
        source, version, repository
    );
}

/// Hooks that only log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHooks;

impl ReconcileHooks for LoggingHooks {}

type PackageCallback = Box<dyn Fn(&str, &str) -> anyhow::Result<()> + Send + Sync>;
type SourceCallback = Box<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;
type VersionCallback = Box<dyn Fn(&str, &str, &str) -> anyhow::Result<()> + Send + Sync>;
type UpstreamCallback =
    Box<dyn Fn(&str, &str, UpstreamRepository) -> anyhow::Result<()> + Send + Sync>;

/// Hooks backed by optional closures; empty slots fall back to logging
#[derive(Default)]
pub struct CallbackHooks {
    on_package_added: Option<PackageCallback>,
    on_package_removed: Option<PackageCallback>,
    on_source_removed: Option<SourceCallback>,
    on_local_version_updated: Option<VersionCallback>,
    on_upstream_version_updated: Option<UpstreamCallback>,
}

impl CallbackHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with `(package, source)`
    pub fn on_package_added(
        mut self,
        f: impl Fn(&str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_package_added = Some(Box::new(f));
        self
    }

    /// Called with `(package, source)`
    pub fn on_package_removed(
        mut self,
        f: impl Fn(&str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_package_removed = Some(Box::new(f));
        self
    }

    pub fn on_source_removed(
        mut self,
        f: impl Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_source_removed = Some(Box::new(f));
        self
    }

    /// Called with `(package, old_version, new_version)`
    pub fn on_local_version_updated(
        mut self,
        f: impl Fn(&str, &str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_local_version_updated = Some(Box::new(f));
        self
    }

    /// Called with `(source, version, repository)`
    pub fn on_upstream_version_updated(
        mut self,
        f: impl Fn(&str, &str, UpstreamRepository) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_upstream_version_updated = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl ReconcileHooks for CallbackHooks {
    async fn package_added(&self, package: &str, source: &str) -> Result<(), HookError> {
        match &self.on_package_added {
            Some(f) => Ok(f(package, source)?),
            None => {
                log_package_added(package, source);
                Ok(())
            }
        }
    }

    async fn package_removed(&self, package: &str, source: &str) -> Result<(), HookError> {
        match &self.on_package_removed {
            Some(f) => Ok(f(package, source)?),
            None => {
                log_package_removed(package, source);
                Ok(())
            }
        }
    }

    async fn source_removed(&self, source: &str) -> Result<(), HookError> {
        match &self.on_source_removed {
            Some(f) => Ok(f(source)?),
            None => {
                log_source_removed(source);
                Ok(())
            }
        }
    }

    async fn local_version_updated(
        &self,
        package: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<(), HookError> {
        match &self.on_local_version_updated {
            Some(f) => Ok(f(package, old_version, new_version)?),
            None => {
                log_local_version_updated(package, old_version, new_version);
                Ok(())
            }
        }
    }

    async fn upstream_version_updated(
        &self,
        source: &str,
        version: &str,
        repository: UpstreamRepository,
    ) -> Result<(), HookError> {
        match &self.on_upstream_version_updated {
            Some(f) => Ok(f(source, version, repository)?),
            None => {
                log_upstream_version_updated(source, version, repository);
                Ok(())
            }
        }
    }
}
