// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading via Figment.
//!
//! Lookup order: `./plexus.toml` > `~/.config/plexus/plexus.toml` >
//! `/etc/plexus/plexus.toml`, with `PLEXUS_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlexusConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/plexus/plexus.toml";
pub(crate) const LOCAL_CONFIG: &str = "plexus.toml";

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plexus/plexus.toml`
/// 3. `~/.config/plexus/plexus.toml`
/// 4. `./plexus.toml`
/// 5. `PLEXUS_*` environment variables
pub fn load_config() -> Result<PlexusConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PlexusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlexusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("plexus/plexus.toml"))
}

/// `PLEXUS_HOST_LOG_LEVEL` must land on `host.log_level`, not
/// `host.log.level`, so sections are mapped explicitly instead of splitting
/// on `_`.
fn env_provider() -> Env {
    Env::prefixed("PLEXUS_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    ["host_", "storage_", "registry_"]
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .map(|rest| format!("{}.{rest}", section.trim_end_matches('_')))
        })
        .unwrap_or_else(|| key.to_string())
}
