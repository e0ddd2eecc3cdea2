// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plexus demo`: a complete host with three built-in sample plugins.
//!
//! - `plexus.sample.Gauge` receives host data (DATA)
//! - `plexus.sample.Horn` performs an action when enabled (ACTION, CONFIGURE)
//! - `plexus.sample.Sensor` publishes its own data list to the host (DATALIST)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plexus_bus::MessageBus;
use plexus_config::PlexusConfig;
use plexus_core::codec::encode_data_list;
use plexus_core::{
    ActionHandler, ComponentAddress, ConfigurationHandler, DataReceiver, DataRecord, Descriptor,
    PlexusError,
};
use plexus_endpoint::Endpoint;
use plexus_registry::PluginRegistry;
use plexus_storage::SqlitePreferences;
use tracing::info;

use crate::lifecycle::TaskLifecycle;

const GAUGE: &str = "plexus.sample.Gauge";
const HORN: &str = "plexus.sample.Horn";
const SENSOR: &str = "plexus.sample.Sensor";
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Prints whatever arrives on the data channel.
struct ConsoleReceiver {
    label: &'static str,
}

#[async_trait]
impl DataReceiver for ConsoleReceiver {
    async fn on_data_list(&self, records: Vec<DataRecord>) -> Result<(), PlexusError> {
        for r in &records {
            println!(
                "[{}] item {} ({}) range {}..{} {}",
                self.label, r.key, r.description, r.min, r.max, r.units
            );
        }
        Ok(())
    }

    async fn on_data_update(&self, key: &str, value: &str) -> Result<(), PlexusError> {
        println!("[{}] {key} = {value}", self.label);
        Ok(())
    }
}

struct Horn;

#[async_trait]
impl ActionHandler for Horn {
    async fn perform_action(&self) -> Result<(), PlexusError> {
        println!("[horn] beep");
        Ok(())
    }
}

#[async_trait]
impl ConfigurationHandler for Horn {
    async fn perform_configure(&self) -> Result<(), PlexusError> {
        println!("[horn] nothing to configure");
        Ok(())
    }
}

fn sample_plugins(bus: &MessageBus) -> Vec<Arc<Endpoint>> {
    let horn = Arc::new(Horn);
    vec![
        Endpoint::builder(
            Descriptor::new("Gauge", GAUGE)
                .with_package("plexus.sample")
                .with_description("shows host values"),
        )
        .data_receiver(Arc::new(ConsoleReceiver { label: "gauge" }))
        .build(bus.clone()),
        Endpoint::builder(
            Descriptor::new("Horn", HORN)
                .with_package("plexus.sample")
                .with_description("beeps when enabled"),
        )
        .action(horn.clone())
        .configure(horn)
        .build(bus.clone()),
        Endpoint::builder(
            Descriptor::new("Sensor", SENSOR)
                .with_package("plexus.sample")
                .with_description("publishes a coolant temperature"),
        )
        .data_provider()
        .build(bus.clone()),
    ]
}

fn host_records() -> Vec<DataRecord> {
    vec![
        DataRecord::new("rpm", "Engine speed", "0", "8000", "rpm"),
        DataRecord::new("speed", "Vehicle speed", "0", "250", "km/h"),
    ]
}

/// Run the sample plugin composition against `config`.
pub async fn run_demo(config: &PlexusConfig) -> Result<(), PlexusError> {
    let bus = MessageBus::new();
    let preferences = Arc::new(SqlitePreferences::open(&config.storage).await?);

    let plugins = sample_plugins(&bus);
    let sensor = plugins
        .iter()
        .find(|p| p.address().as_str() == SENSOR)
        .cloned();
    let mut lifecycle = TaskLifecycle::new(bus.clone());
    for plugin in plugins {
        lifecycle.install(plugin);
    }
    let lifecycle = Arc::new(lifecycle);
    lifecycle.launch_all().await;

    let registry = Arc::new(
        PluginRegistry::new(
            config.host.descriptor(),
            bus.clone(),
            lifecycle.clone(),
            preferences.clone(),
        )
        .with_default_enabled(config.registry.default_enabled),
    );
    registry.set_data_receiver(Some(Arc::new(ConsoleReceiver { label: "host" })));
    registry.start();

    if config.registry.identify_on_start {
        registry.identify_all();
    } else {
        for component in [GAUGE, HORN, SENSOR] {
            registry.identify(&ComponentAddress::from(component));
        }
    }
    wait_for_plugins(&registry, 3).await?;

    if let Some(sensor) = sensor {
        sensor.send_data_list(&[DataRecord::new("coolant", "Coolant temperature", "-40", "150", "C")])?;
        sensor.send_data_update("coolant", "87")?;
    }

    let issued = registry.distribute_list(&encode_data_list(&host_records())).await;
    registry.distribute_update("rpm", "2400").await;
    registry.distribute_update("speed", "63").await;
    info!(targets = issued, "host data distributed");

    // Let endpoint tasks drain their queues before printing.
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!();
    println!("{:<24} {:<8} {:<22} {}", "COMPONENT", "ENABLED", "FEATURES", "NAME");
    for d in registry.snapshot().await {
        println!(
            "{:<24} {:<8} {:<22} {}",
            d.component.as_str(),
            if d.enabled { "yes" } else { "no" },
            d.features.to_string(),
            d.name
        );
    }

    registry.shutdown().await;
    lifecycle.stop_all().await;
    preferences.database().close().await
}

async fn wait_for_plugins(registry: &PluginRegistry, expected: usize) -> Result<(), PlexusError> {
    let waited = tokio::time::timeout(DISCOVERY_TIMEOUT, async {
        while registry.len().await < expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if waited.is_err() {
        return Err(PlexusError::Internal(format!(
            "only {} of {expected} plugins answered",
            registry.len().await
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::Features;

    #[test]
    fn sample_plugins_declare_expected_features() {
        let bus = MessageBus::new();
        let features: Vec<(String, Features)> = sample_plugins(&bus)
            .iter()
            .map(|p| (p.address().to_string(), p.descriptor().features))
            .collect();
        assert_eq!(
            features,
            vec![
                (GAUGE.to_string(), Features::DATA),
                (HORN.to_string(), Features::ACTION | Features::CONFIGURE),
                (SENSOR.to_string(), Features::DATALIST),
            ]
        );
    }

    #[tokio::test]
    async fn demo_runs_against_temp_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PlexusConfig::default();
        config.storage.database_path = dir.path().join("demo.db").to_string_lossy().into_owned();
        run_demo(&config).await.unwrap();
    }
}
