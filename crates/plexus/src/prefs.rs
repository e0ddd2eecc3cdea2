// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plexus prefs` subcommands.

use clap::{Subcommand, ValueEnum};
use plexus_config::PlexusConfig;
use plexus_core::{ComponentAddress, PlexusError, PreferenceStore};
use plexus_storage::SqlitePreferences;

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// List stored plugin enabled flags.
    List,
    /// Store the enabled flag for one plugin.
    Set {
        /// Component address of the plugin.
        component: String,
        state: Toggle,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(t: Toggle) -> bool {
        t == Toggle::On
    }
}

/// Execute a `prefs` subcommand against the configured database.
pub async fn run_prefs(config: &PlexusConfig, command: PrefsCommand) -> Result<(), PlexusError> {
    let store = SqlitePreferences::open(&config.storage).await?;
    match command {
        PrefsCommand::List => {
            let entries = store.list().await?;
            if entries.is_empty() {
                println!("no stored preferences in {}", config.storage.database_path);
            }
            for line in format_entries(&entries) {
                println!("{line}");
            }
        }
        PrefsCommand::Set { component, state } => {
            let component = ComponentAddress::new(component);
            store.set_enabled(&component, state.into()).await?;
            println!("{component}: {}", on_off(state.into()));
        }
    }
    store.database().close().await
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn format_entries(entries: &[(ComponentAddress, bool)]) -> Vec<String> {
    let width = entries
        .iter()
        .map(|(c, _)| c.as_str().len())
        .max()
        .unwrap_or(0);
    entries
        .iter()
        .map(|(c, enabled)| format!("{:<width$}  {}", c.as_str(), on_off(*enabled)))
        .collect()
}
