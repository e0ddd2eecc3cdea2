// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`PreferenceStore`].

use async_trait::async_trait;
use plexus_config::model::StorageConfig;
use plexus_core::{ComponentAddress, PlexusError, PreferenceStore};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};

/// Persists plugin enabled flags keyed by component address.
pub struct SqlitePreferences {
    db: Database,
}

impl SqlitePreferences {
    /// Wrap an already opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by the `[storage]` config section.
    pub async fn open(config: &StorageConfig) -> Result<Self, PlexusError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Forget the stored flag for one component. Returns whether a row existed.
    pub async fn remove(&self, component: &ComponentAddress) -> Result<bool, PlexusError> {
        let key = component.to_string();
        let removed = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM plugin_preferences WHERE component = ?1",
                    params![key],
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferences {
    async fn get_enabled(
        &self,
        component: &ComponentAddress,
        default: bool,
    ) -> Result<bool, PlexusError> {
        let key = component.to_string();
        let stored: Option<bool> = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT enabled FROM plugin_preferences WHERE component = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        Ok(stored.unwrap_or(default))
    }

    async fn set_enabled(
        &self,
        component: &ComponentAddress,
        enabled: bool,
    ) -> Result<(), PlexusError> {
        let key = component.to_string();
        let now = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO plugin_preferences (component, enabled, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(component) DO UPDATE
                     SET enabled = excluded.enabled, updated_at = excluded.updated_at",
                    params![key, enabled, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(component = %component, enabled, "plugin preference stored");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(ComponentAddress, bool)>, PlexusError> {
        self.db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT component, enabled FROM plugin_preferences ORDER BY component",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((ComponentAddress::new(row.get::<_, String>(0)?), row.get(1)?))
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)
    }
}
