// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process/service lifecycle collaborator.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PlexusError;
use crate::message::Message;
use crate::types::ComponentAddress;

/// Token for one live binding to a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingHandle {
    pub component: ComponentAddress,
    pub id: Uuid,
}

impl BindingHandle {
    /// Issue a handle with a fresh id.
    pub fn new(component: ComponentAddress) -> Self {
        Self {
            component,
            id: Uuid::new_v4(),
        }
    }
}

/// Starts, binds and stops plugin processes.
///
/// The registry treats every call as best-effort: errors are logged and
/// discarded, and the registry's own state transition completes regardless.
/// Implementations must tolerate `stop` for components that are not running.
#[async_trait]
pub trait LifecycleManager: Send + Sync + 'static {
    /// Make sure the component is running, delivering `msg` as its start request.
    async fn start(&self, component: &ComponentAddress, msg: &Message) -> Result<(), PlexusError>;

    /// Hold the component alive until the returned handle is unbound.
    async fn bind(&self, component: &ComponentAddress) -> Result<BindingHandle, PlexusError>;

    /// Release a binding obtained from [`bind`](Self::bind).
    async fn unbind(&self, handle: BindingHandle) -> Result<(), PlexusError>;

    /// Stop the component.
    async fn stop(&self, component: &ComponentAddress) -> Result<(), PlexusError>;
}
