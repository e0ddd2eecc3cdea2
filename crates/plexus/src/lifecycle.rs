// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process lifecycle manager.
//!
//! Plugins are endpoints compiled into the binary. "Starting" one spawns its
//! task on the shared bus; "stopping" cancels it. Bindings are bookkeeping
//! only, since nothing outside the process can reap a task.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use plexus_bus::MessageBus;
use plexus_core::{BindingHandle, ComponentAddress, LifecycleManager, Message, PlexusError};
use plexus_endpoint::{Endpoint, EndpointHandle};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Runs installed endpoints as tokio tasks on one bus.
pub struct TaskLifecycle {
    bus: MessageBus,
    installed: HashMap<ComponentAddress, Arc<Endpoint>>,
    running: Mutex<HashMap<ComponentAddress, EndpointHandle>>,
}

impl TaskLifecycle {
    /// Create a lifecycle with nothing installed.
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            installed: HashMap::new(),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Make an endpoint available for starting.
    pub fn install(&mut self, endpoint: Arc<Endpoint>) {
        self.installed.insert(endpoint.address().clone(), endpoint);
    }

    /// Installed endpoint for `component`.
    pub fn endpoint(&self, component: &ComponentAddress) -> Option<&Arc<Endpoint>> {
        self.installed.get(component)
    }

    /// Spawn every installed endpoint that is not running yet.
    pub async fn launch_all(&self) {
        let mut running = self.running.lock().await;
        for (component, endpoint) in &self.installed {
            running
                .entry(component.clone())
                .or_insert_with(|| endpoint.spawn());
        }
    }

    pub async fn is_running(&self, component: &ComponentAddress) -> bool {
        self.running.lock().await.contains_key(component)
    }

    /// Stop every running endpoint.
    pub async fn stop_all(&self) {
        let handles: Vec<EndpointHandle> =
            self.running.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.stop().await;
        }
    }
}

#[async_trait]
impl LifecycleManager for TaskLifecycle {
    async fn start(&self, component: &ComponentAddress, msg: &Message) -> Result<(), PlexusError> {
        let endpoint = self
            .installed
            .get(component)
            .ok_or_else(|| PlexusError::Lifecycle {
                component: component.clone(),
                message: "no such plugin installed".to_string(),
            })?;
        {
            let mut running = self.running.lock().await;
            if !running.contains_key(component) {
                info!(component = %component, "launching plugin");
                running.insert(component.clone(), endpoint.spawn());
            }
        }
        self.bus.publish(msg.clone());
        Ok(())
    }

    async fn bind(&self, component: &ComponentAddress) -> Result<BindingHandle, PlexusError> {
        let handle = BindingHandle::new(component.clone());
        debug!(component = %component, binding = %handle.id, "plugin bound");
        Ok(handle)
    }

    async fn unbind(&self, handle: BindingHandle) -> Result<(), PlexusError> {
        debug!(component = %handle.component, binding = %handle.id, "plugin unbound");
        Ok(())
    }

    async fn stop(&self, component: &ComponentAddress) -> Result<(), PlexusError> {
        let handle = self.running.lock().await.remove(component);
        if let Some(handle) = handle {
            info!(component = %component, "stopping plugin");
            handle.stop().await;
        }
        Ok(())
    }
}
