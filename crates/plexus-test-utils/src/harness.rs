// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end scenarios.
//!
//! `TestHarness` wires a bus, a started [`PluginRegistry`], a
//! [`MockLifecycle`] and a preference store together, and spawns plugin
//! endpoints on the same bus.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use plexus_bus::MessageBus;
use plexus_config::model::StorageConfig;
use plexus_core::{ComponentAddress, Descriptor, PlexusError, PreferenceStore};
use plexus_endpoint::{Endpoint, EndpointBuilder, EndpointHandle};
use plexus_registry::{MemoryPreferences, PluginRegistry};
use plexus_storage::SqlitePreferences;
use tempfile::TempDir;

use crate::mock_lifecycle::MockLifecycle;
use crate::recording::RecordingReceiver;

/// Default wait used by harness helpers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll `check` until it returns `true` or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(timeout, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    host: Descriptor,
    default_enabled: bool,
    preferences: Vec<(ComponentAddress, bool)>,
    sqlite: bool,
    deliver_start: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            host: Descriptor::new("Test Host", "test.Host"),
            default_enabled: true,
            preferences: Vec::new(),
            sqlite: false,
            deliver_start: false,
        }
    }

    /// Use `host` as the registry's own descriptor.
    pub fn with_host(mut self, host: Descriptor) -> Self {
        self.host = host;
        self
    }

    /// Enablement for components without a stored flag.
    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Seed a stored enabled flag.
    pub fn with_preference(mut self, component: impl Into<ComponentAddress>, enabled: bool) -> Self {
        self.preferences.push((component.into(), enabled));
        self
    }

    /// Persist preferences in a temporary SQLite database.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Have the mock lifecycle publish start requests on the bus.
    pub fn delivering_start_requests(mut self) -> Self {
        self.deliver_start = true;
        self
    }

    /// Assemble the harness and start the registry listeners.
    pub async fn build(self) -> Result<TestHarness, PlexusError> {
        let bus = MessageBus::new();
        let lifecycle = Arc::new(if self.deliver_start {
            MockLifecycle::delivering_to(bus.clone())
        } else {
            MockLifecycle::new()
        });

        let (preferences, temp_dir): (Arc<dyn PreferenceStore>, Option<TempDir>) = if self.sqlite {
            let dir = tempfile::tempdir().map_err(|e| PlexusError::Storage {
                source: Box::new(e),
            })?;
            let config = StorageConfig {
                database_path: dir.path().join("prefs.db").to_string_lossy().into_owned(),
                wal_mode: true,
            };
            let store = SqlitePreferences::open(&config).await?;
            for (component, enabled) in &self.preferences {
                store.set_enabled(component, *enabled).await?;
            }
            let store: Arc<dyn PreferenceStore> = Arc::new(store);
            (store, Some(dir))
        } else {
            let store: Arc<dyn PreferenceStore> =
                Arc::new(MemoryPreferences::with_flags(self.preferences));
            (store, None)
        };

        let registry = Arc::new(
            PluginRegistry::new(
                self.host,
                bus.clone(),
                lifecycle.clone(),
                preferences.clone(),
            )
            .with_default_enabled(self.default_enabled),
        );
        let host_receiver = Arc::new(RecordingReceiver::new());
        registry.set_data_receiver(Some(host_receiver.clone()));
        registry.start();

        Ok(TestHarness {
            bus,
            registry,
            lifecycle,
            preferences,
            host_receiver,
            endpoints: Vec::new(),
            _temp_dir: temp_dir,
        })
    }
}

/// A running registry plus the endpoints spawned on its bus.
pub struct TestHarness {
    pub bus: MessageBus,
    pub registry: Arc<PluginRegistry>,
    pub lifecycle: Arc<MockLifecycle>,
    pub preferences: Arc<dyn PreferenceStore>,
    /// Receives data sent to the host bridge.
    pub host_receiver: Arc<RecordingReceiver>,
    endpoints: Vec<EndpointHandle>,
    _temp_dir: Option<TempDir>,
}

impl TestHarness {
    /// Start configuring a harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Build an endpoint on the harness bus and spawn it.
    pub fn spawn_plugin(
        &mut self,
        descriptor: Descriptor,
        declare: impl FnOnce(EndpointBuilder) -> EndpointBuilder,
    ) -> Arc<Endpoint> {
        let endpoint = declare(Endpoint::builder(descriptor)).build(self.bus.clone());
        self.endpoints.push(endpoint.spawn());
        endpoint
    }

    /// Stop one spawned endpoint. Returns `false` if it was not running.
    pub async fn stop_plugin(&mut self, component: &ComponentAddress) -> bool {
        match self.endpoints.iter().position(|h| h.component() == component) {
            Some(idx) => {
                self.endpoints.swap_remove(idx).stop().await;
                true
            }
            None => false,
        }
    }

    /// Broadcast IDENTIFY and wait until the registry holds `expected` entries.
    pub async fn discover(&self, expected: usize) -> Result<Vec<Descriptor>, PlexusError> {
        self.registry.identify_all();
        let registry = self.registry.clone();
        let found = eventually(DEFAULT_TIMEOUT, || {
            let registry = registry.clone();
            async move { registry.len().await >= expected }
        })
        .await;
        if !found {
            return Err(PlexusError::Internal(format!(
                "expected {expected} plugins, registry has {}",
                self.registry.len().await
            )));
        }
        Ok(self.registry.snapshot().await)
    }

    /// Shut the registry down and stop every endpoint.
    pub async fn shutdown(self) {
        self.registry.shutdown().await;
        for handle in self.endpoints {
            handle.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::Features;

    #[tokio::test]
    async fn harness_discovers_spawned_plugins() {
        let mut harness = TestHarness::builder().build().await.unwrap();
        harness.spawn_plugin(Descriptor::new("A", "p.A"), |b| b.data_provider());
        let found = harness.discover(1).await.unwrap();
        assert_eq!(found[0].component.as_str(), "p.A");
        assert_eq!(found[0].features, Features::DATALIST);
        harness.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_harness_applies_seeded_preference() {
        let mut harness = TestHarness::builder()
            .with_sqlite()
            .with_preference("p.A", false)
            .build()
            .await
            .unwrap();
        harness.spawn_plugin(Descriptor::new("A", "p.A"), |b| b);
        let found = harness.discover(1).await.unwrap();
        assert!(!found[0].enabled);
        harness.shutdown().await;
    }

    #[tokio::test]
    async fn discover_times_out_without_plugins() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.discover(1).await.is_err());
        harness.shutdown().await;
    }
}
