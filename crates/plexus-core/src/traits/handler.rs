// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional capability handlers a plugin may implement.

use async_trait::async_trait;

use crate::codec::DataRecord;
use crate::error::PlexusError;

/// Plugin supports CONFIGURE requests.
#[async_trait]
pub trait ConfigurationHandler: Send + Sync + 'static {
    /// Perform plugin configuration.
    async fn perform_configure(&self) -> Result<(), PlexusError>;
}

/// Plugin supports ACTION requests.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    /// Perform the plugin's intended action.
    async fn perform_action(&self) -> Result<(), PlexusError>;
}

/// Receiver side of the data channel.
///
/// Implemented by plugins that declare the DATA feature and by the host
/// application when it registers itself with the host data bridge.
#[async_trait]
pub trait DataReceiver: Send + Sync + 'static {
    /// A full data list arrived. Malformed lines have already been dropped.
    async fn on_data_list(&self, records: Vec<DataRecord>) -> Result<(), PlexusError>;

    /// A single value changed.
    async fn on_data_update(&self, key: &str, value: &str) -> Result<(), PlexusError>;
}
