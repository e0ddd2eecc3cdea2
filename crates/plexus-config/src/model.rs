// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plexus host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a mistyped key is a
//! startup error rather than a silently ignored setting.

use plexus_core::Descriptor;
use serde::{Deserialize, Serialize};

/// Top-level Plexus configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlexusConfig {
    /// Identity the host announces on the bus.
    #[serde(default)]
    pub host: HostConfig,

    /// Preference database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Discovery and enablement defaults.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Host identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Human-readable host name.
    #[serde(default = "default_host_name")]
    pub name: String,

    /// Component address of the host (and of its data bridge).
    #[serde(default = "default_host_address")]
    pub address: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub copyright: String,

    #[serde(default)]
    pub license: String,

    #[serde(default)]
    pub url: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_host_name(),
            address: default_host_address(),
            description: String::new(),
            copyright: String::new(),
            license: String::new(),
            url: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl HostConfig {
    /// Descriptor sent with the host's IDENTIFY requests.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::new(self.name.clone(), self.address.clone())
            .with_description(self.description.clone())
            .with_copyright(self.copyright.clone())
            .with_license(self.license.clone())
            .with_url(self.url.clone())
    }
}

fn default_host_name() -> String {
    "plexus".to_string()
}

fn default_host_address() -> String {
    "plexus.host".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Preference database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("plexus").join("plexus.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("plexus.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Registry behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Broadcast IDENTIFY as soon as the registry starts.
    #[serde(default = "default_true")]
    pub identify_on_start: bool,

    /// Enabled flag for components with no stored preference.
    #[serde(default = "default_true")]
    pub default_enabled: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            identify_on_start: true,
            default_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_descriptor_uses_configured_identity() {
        let host = HostConfig {
            name: "Dash".into(),
            address: "dash.Host".into(),
            license: "MIT".into(),
            ..HostConfig::default()
        };
        let d = host.descriptor();
        assert_eq!(d.name, "Dash");
        assert_eq!(d.component.as_str(), "dash.Host");
        assert_eq!(d.license, "MIT");
        assert!(d.features.is_empty());
    }

    #[test]
    fn registry_section_deserializes_partially() {
        let config: PlexusConfig = toml::from_str(
            r#"
[registry]
default_enabled = false
"#,
        )
        .unwrap();
        assert!(!config.registry.default_enabled);
        assert!(config.registry.identify_on_start);
    }
}
