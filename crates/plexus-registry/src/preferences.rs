// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory preference store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use plexus_core::{ComponentAddress, PlexusError, PreferenceStore};
use tokio::sync::RwLock;

/// Non-durable [`PreferenceStore`] for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    flags: RwLock<BTreeMap<ComponentAddress, bool>>,
}

impl MemoryPreferences {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed stored flags, as if persisted by an earlier run.
    pub fn with_flags(flags: impl IntoIterator<Item = (ComponentAddress, bool)>) -> Self {
        Self {
            flags: RwLock::new(flags.into_iter().collect()),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get_enabled(
        &self,
        component: &ComponentAddress,
        default: bool,
    ) -> Result<bool, PlexusError> {
        Ok(self
            .flags
            .read()
            .await
            .get(component)
            .copied()
            .unwrap_or(default))
    }

    async fn set_enabled(
        &self,
        component: &ComponentAddress,
        enabled: bool,
    ) -> Result<(), PlexusError> {
        self.flags.write().await.insert(component.clone(), enabled);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(ComponentAddress, bool)>, PlexusError> {
        Ok(self
            .flags
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_component_uses_default() {
        let prefs = MemoryPreferences::new();
        let addr = ComponentAddress::from("p.A");
        assert!(prefs.get_enabled(&addr, true).await.unwrap());
        assert!(!prefs.get_enabled(&addr, false).await.unwrap());
    }

    #[tokio::test]
    async fn stored_flag_wins_over_default() {
        let prefs = MemoryPreferences::new();
        let addr = ComponentAddress::from("p.A");
        prefs.set_enabled(&addr, false).await.unwrap();
        assert!(!prefs.get_enabled(&addr, true).await.unwrap());
        assert_eq!(prefs.list().await.unwrap(), vec![(addr, false)]);
    }
}
