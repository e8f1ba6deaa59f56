//! Hooks that notify maintainers of stale packages

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::notify::NotifyError;
use crate::notify::email::{EmailNotifier, PackageUpdate};
use crate::reconcile::error::HookError;
use crate::reconcile::hooks::ReconcileHooks;
use crate::store::state::StateStore;
use crate::upstream::resolver::UpstreamRepository;
use crate::version::compare::{VersionComparison, compare};

/// Sends an e-mail for every package left behind by a new upstream version
///
/// All other events keep the default logging behavior.
pub struct NotifyingHooks<S: StateStore> {
    store: Arc<S>,
    notifier: EmailNotifier,
}

impl<S: StateStore> NotifyingHooks<S> {
    pub fn new(store: Arc<S>, notifier: EmailNotifier) -> Self {
        Self { store, notifier }
    }

    async fn notify_source_without_packages(
        &self,
        source: &str,
        version: &str,
        repository: UpstreamRepository,
    ) -> Result<(), Vec<NotifyError>> {
        let local = self.store.source(source).map_err(|e| vec![e.into()])?;

        let Some(local) = local else {
            warn!("No local version recorded for {}, skipping notification", source);
            return Ok(());
        };

        if compare(&local.local_version, version) != VersionComparison::Older {
            return Ok(());
        }

        self.notifier
            .notify(&PackageUpdate {
                package: source,
                source,
                maintainer: None,
                local_version: &local.local_version,
                upstream_version: version,
                repository: repository.as_str(),
            })
            .await
            .map_err(|e| vec![e])
    }
}

#[async_trait]
impl<S: StateStore> ReconcileHooks for NotifyingHooks<S> {
    async fn upstream_version_updated(
        &self,
        source: &str,
        version: &str,
        repository: UpstreamRepository,
    ) -> Result<(), HookError> {
        info!(
            "Source {} upstream version updated to {} ({})",
            source, version, repository
        );

        let packages = self
            .store
            .packages_by_source(source)
            .map_err(|e| HookError::Notification(vec![e.into()]))?;

        if packages.is_empty() {
            return self
                .notify_source_without_packages(source, version, repository)
                .await
                .map_err(HookError::Notification);
        }

        let mut failures = Vec::new();
        for package in &packages {
            let comparison = compare(&package.local_version, version);
            if comparison != VersionComparison::Older {
                debug!(
                    "Not notifying about {} {}: {} upstream {}",
                    package.name, package.local_version, comparison, version
                );
                continue;
            }

            let update = PackageUpdate {
                package: &package.name,
                source,
                maintainer: package.maintainer.as_deref(),
                local_version: &package.local_version,
                upstream_version: version,
                repository: repository.as_str(),
            };
            if let Err(e) = self.notifier.notify(&update).await {
                warn!("Failed to notify about {}: {}", package.name, e);
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HookError::Notification(failures))
        }
    }
}
