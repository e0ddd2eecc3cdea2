// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable enabled/disabled preference per component.

use async_trait::async_trait;

use crate::error::PlexusError;
use crate::types::ComponentAddress;

/// Key-value store remembering whether each plugin is enabled.
#[async_trait]
pub trait PreferenceStore: Send + Sync + 'static {
    /// Stored flag for `component`, or `default` if none was ever stored.
    async fn get_enabled(
        &self,
        component: &ComponentAddress,
        default: bool,
    ) -> Result<bool, PlexusError>;

    /// Persist the flag for `component`.
    async fn set_enabled(
        &self,
        component: &ComponentAddress,
        enabled: bool,
    ) -> Result<(), PlexusError>;

    /// All stored flags, ordered by component address.
    async fn list(&self) -> Result<Vec<(ComponentAddress, bool)>, PlexusError>;
}
