//! Resolver, hook and transport doubles

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use distro_tracker::notify::{MailTransport, NotifyError, OutgoingMail};
use distro_tracker::reconcile::{HookError, ReconcileHooks};
use distro_tracker::upstream::{ResolveError, UpstreamRepository, UpstreamResolver};

/// Resolver answering from a fixed table
#[derive(Default)]
pub struct StaticResolver {
    versions: HashMap<String, String>,
    failing: HashSet<String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, source: &str, version: &str) -> Self {
        self.versions.insert(source.to_string(), version.to_string());
        self
    }

    /// Lookups for this source fail with a network-style error
    pub fn failing_for(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }
}

#[async_trait]
impl UpstreamResolver for StaticResolver {
    fn repository(&self) -> UpstreamRepository {
        UpstreamRepository::Nixos
    }

    async fn resolve(&self, source_name: &str) -> Result<Option<String>, ResolveError> {
        if self.failing.contains(source_name) {
            return Err(ResolveError::IndexUnavailable(format!(
                "lookup of {source_name} timed out"
            )));
        }
        Ok(self.versions.get(source_name).cloned())
    }
}

/// Hook event as recorded by [`RecordingHooks`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PackageAdded(String, String),
    PackageRemoved(String, String),
    SourceRemoved(String),
    LocalVersionUpdated(String, String, String),
    UpstreamVersionUpdated(String, String),
}

impl Event {
    pub fn package_added(package: &str, source: &str) -> Self {
        Event::PackageAdded(package.to_string(), source.to_string())
    }

    pub fn package_removed(package: &str, source: &str) -> Self {
        Event::PackageRemoved(package.to_string(), source.to_string())
    }

    pub fn source_removed(source: &str) -> Self {
        Event::SourceRemoved(source.to_string())
    }

    pub fn local_version_updated(package: &str, old: &str, new: &str) -> Self {
        Event::LocalVersionUpdated(package.to_string(), old.to_string(), new.to_string())
    }

    pub fn upstream_version_updated(source: &str, version: &str) -> Self {
        Event::UpstreamVersionUpdated(source.to_string(), version.to_string())
    }
}

/// Hooks that remember every event in order
#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<Event>>,
}

impl RecordingHooks {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Forget everything recorded so far
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn record(&self, event: Event) -> Result<(), HookError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl ReconcileHooks for RecordingHooks {
    async fn package_added(&self, package: &str, source: &str) -> Result<(), HookError> {
        self.record(Event::package_added(package, source))
    }

    async fn package_removed(&self, package: &str, source: &str) -> Result<(), HookError> {
        self.record(Event::package_removed(package, source))
    }

    async fn source_removed(&self, source: &str) -> Result<(), HookError> {
        self.record(Event::source_removed(source))
    }

    async fn local_version_updated(
        &self,
        package: &str,
        old_version: &str,
        new_version: &str,
    ) -> Result<(), HookError> {
        self.record(Event::local_version_updated(package, old_version, new_version))
    }

    async fn upstream_version_updated(
        &self,
        source: &str,
        version: &str,
        _repository: UpstreamRepository,
    ) -> Result<(), HookError> {
        self.record(Event::upstream_version_updated(source, version))
    }
}

/// Transport that keeps sent mail in memory
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryTransport {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}
