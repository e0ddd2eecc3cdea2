// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording capability handlers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use plexus_core::{
    ActionHandler, ComponentAddress, ConfigurationHandler, DataReceiver, DataRecord, PlexusError,
};
use tokio::sync::{Mutex, Notify};

/// Captures everything delivered through the data channel.
#[derive(Default)]
pub struct RecordingReceiver {
    lists: Mutex<Vec<Vec<DataRecord>>>,
    updates: Mutex<Vec<(String, String)>>,
    notify: Notify,
}

impl RecordingReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data lists received so far.
    pub async fn lists(&self) -> Vec<Vec<DataRecord>> {
        self.lists.lock().await.clone()
    }

    /// `(key, value)` updates received so far.
    pub async fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().await.clone()
    }

    /// Total deliveries (lists plus updates).
    pub async fn deliveries(&self) -> usize {
        self.lists.lock().await.len() + self.updates.lock().await.len()
    }

    /// Wait until at least `n` deliveries arrived. Returns `false` on timeout.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.deliveries().await >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl DataReceiver for RecordingReceiver {
    async fn on_data_list(&self, records: Vec<DataRecord>) -> Result<(), PlexusError> {
        self.lists.lock().await.push(records);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn on_data_update(&self, key: &str, value: &str) -> Result<(), PlexusError> {
        self.updates
            .lock()
            .await
            .push((key.to_string(), value.to_string()));
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Counts CONFIGURE and ACTION requests.
pub struct RecordingHandler {
    component: ComponentAddress,
    configures: AtomicUsize,
    actions: AtomicUsize,
    fail: AtomicBool,
    notify: Notify,
}

impl RecordingHandler {
    pub fn new(component: impl Into<ComponentAddress>) -> Self {
        Self {
            component: component.into(),
            configures: AtomicUsize::new(0),
            actions: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Count the call, then return a handler error.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn configure_count(&self) -> usize {
        self.configures.load(Ordering::SeqCst)
    }

    pub fn action_count(&self) -> usize {
        self.actions.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` actions ran. Returns `false` on timeout.
    pub async fn wait_for_actions(&self, n: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.action_count() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    fn finish(&self, what: &str) -> Result<(), PlexusError> {
        self.notify.notify_waiters();
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlexusError::Handler {
                component: self.component.clone(),
                message: format!("{what} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationHandler for RecordingHandler {
    async fn perform_configure(&self) -> Result<(), PlexusError> {
        self.configures.fetch_add(1, Ordering::SeqCst);
        self.finish("configure")
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn perform_action(&self) -> Result<(), PlexusError> {
        self.actions.fetch_add(1, Ordering::SeqCst);
        self.finish("action")
    }
}
