// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock lifecycle manager.
//!
//! `MockLifecycle` records every call made by the registry. Optionally it
//! forwards the start request onto a bus, the way a real host would deliver
//! it to the component it just launched.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use plexus_bus::MessageBus;
use plexus_core::{BindingHandle, ComponentAddress, LifecycleManager, Message, PlexusError};
use tokio::sync::Mutex;

/// One recorded lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCall {
    /// `start` was called for the component.
    Start(ComponentAddress),
    /// A binding was requested.
    Bind(ComponentAddress),
    /// The binding for the component was released.
    Unbind(ComponentAddress),
    /// `stop` was called for the component.
    Stop(ComponentAddress),
}

impl LifecycleCall {
    /// Component the call concerned.
    pub fn component(&self) -> &ComponentAddress {
        match self {
            Self::Start(c) | Self::Bind(c) | Self::Unbind(c) | Self::Stop(c) => c,
        }
    }
}

/// Recording [`LifecycleManager`] for tests.
#[derive(Default)]
pub struct MockLifecycle {
    /// Every call in arrival order.
    calls: Mutex<Vec<LifecycleCall>>,
    /// When set, calls are recorded and then fail.
    fail: AtomicBool,
    /// Bus that receives start requests, if delivering.
    bus: Option<MessageBus>,
}

impl MockLifecycle {
    /// Create a mock that records calls and never delivers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish each start request on `bus`.
    pub fn delivering_to(bus: MessageBus) -> Self {
        Self {
            bus: Some(bus),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail (after being recorded).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All calls so far.
    pub async fn calls(&self) -> Vec<LifecycleCall> {
        self.calls.lock().await.clone()
    }

    /// Calls concerning one component, in order.
    pub async fn calls_for(&self, component: &ComponentAddress) -> Vec<LifecycleCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.component() == component)
            .cloned()
            .collect()
    }

    /// How many times exactly `call` was recorded.
    pub async fn count(&self, call: &LifecycleCall) -> usize {
        self.calls.lock().await.iter().filter(|c| *c == call).count()
    }

    /// Forget all recorded calls.
    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: LifecycleCall) -> Result<(), PlexusError> {
        let component = call.component().clone();
        self.calls.lock().await.push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlexusError::Lifecycle {
                component,
                message: "mock lifecycle failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LifecycleManager for MockLifecycle {
    async fn start(&self, component: &ComponentAddress, msg: &Message) -> Result<(), PlexusError> {
        self.record(LifecycleCall::Start(component.clone())).await?;
        if let Some(bus) = &self.bus {
            bus.publish(msg.clone());
        }
        Ok(())
    }

    async fn bind(&self, component: &ComponentAddress) -> Result<BindingHandle, PlexusError> {
        self.record(LifecycleCall::Bind(component.clone())).await?;
        Ok(BindingHandle::new(component.clone()))
    }

    async fn unbind(&self, handle: BindingHandle) -> Result<(), PlexusError> {
        self.record(LifecycleCall::Unbind(handle.component)).await
    }

    async fn stop(&self, component: &ComponentAddress) -> Result<(), PlexusError> {
        self.record(LifecycleCall::Stop(component.clone())).await
    }
}
