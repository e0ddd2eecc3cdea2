// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side plugin registry.
//!
//! The `PluginRegistry` keeps one [`Descriptor`] per discovered component,
//! in discovery order. It drives discovery over the bus, applies persisted
//! enablement on first sight, starts/binds/unbinds/stops components through
//! a [`LifecycleManager`], and fans data out to every enabled entry that
//! declared the DATA feature.
//!
//! All state changes go through one async mutex, so discovery responses,
//! enablement changes and fan-out never interleave.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use plexus_bus::{Filter, MessageBus, Subscription};
use plexus_core::{
    Addressing, BindingHandle, Category, ComponentAddress, DataReceiver, Descriptor, Features,
    Kind, LifecycleManager, Message, PreferenceStore,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::HostDataBridge;

/// Result of inserting a descriptor into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First time this address was seen.
    New,
    /// An entry with the same address was replaced in place.
    Existing,
}

impl std::fmt::Display for Upsert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Upsert::New => write!(f, "new"),
            Upsert::Existing => write!(f, "existing"),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<Descriptor>,
    bindings: HashMap<ComponentAddress, BindingHandle>,
}

impl RegistryState {
    fn position(&self, component: &ComponentAddress) -> Option<usize> {
        self.entries.iter().position(|d| &d.component == component)
    }

    fn upsert(&mut self, descriptor: Descriptor) -> Upsert {
        match self.position(&descriptor.component) {
            Some(idx) => {
                self.entries[idx] = descriptor;
                Upsert::Existing
            }
            None => {
                self.entries.push(descriptor);
                Upsert::New
            }
        }
    }
}

#[derive(Debug, Default)]
struct Listeners {
    token: Option<CancellationToken>,
    tasks: Vec<JoinHandle<()>>,
}

/// Registry of discovered plugins.
pub struct PluginRegistry {
    host: Descriptor,
    bus: MessageBus,
    lifecycle: Arc<dyn LifecycleManager>,
    preferences: Arc<dyn PreferenceStore>,
    default_enabled: bool,
    state: Mutex<RegistryState>,
    bridge: Arc<HostDataBridge>,
    listeners: std::sync::Mutex<Listeners>,
}

impl PluginRegistry {
    /// Create a registry acting on behalf of `host`.
    ///
    /// The host descriptor is sent with every IDENTIFY request and its
    /// address doubles as the address of the host data bridge.
    pub fn new(
        host: Descriptor,
        bus: MessageBus,
        lifecycle: Arc<dyn LifecycleManager>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let bridge = Arc::new(HostDataBridge::new(host.component.clone()));
        Self {
            host,
            bus,
            lifecycle,
            preferences,
            default_enabled: true,
            state: Mutex::new(RegistryState::default()),
            bridge,
            listeners: std::sync::Mutex::new(Listeners::default()),
        }
    }

    /// Enablement applied to components with no stored preference.
    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Descriptor sent with every IDENTIFY request.
    pub fn host(&self) -> &Descriptor {
        &self.host
    }

    /// Bus the registry publishes on.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// The host data bridge owned by this registry.
    pub fn bridge(&self) -> &Arc<HostDataBridge> {
        &self.bridge
    }

    /// Register (or detach with `None`) the host application's data receiver.
    pub fn set_data_receiver(&self, receiver: Option<Arc<dyn DataReceiver>>) {
        self.bridge.set_receiver(receiver);
    }

    /// Start the discovery listener and the host data bridge.
    ///
    /// Calling `start` on a running registry is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if listeners.token.is_some() {
            debug!("plugin registry already started");
            return;
        }
        let token = CancellationToken::new();

        let subscription = self
            .bus
            .subscribe(None, Filter::only(Kind::Identify, Category::Response));
        listeners
            .tasks
            .push(self.spawn_discovery(subscription, token.clone()));
        listeners
            .tasks
            .push(self.bridge.spawn(&self.bus, token.clone()));
        listeners.token = Some(token);

        info!(host = %self.host.component, "plugin registry started");
    }

    fn spawn_discovery(
        self: &Arc<Self>,
        mut subscription: Subscription,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    msg = subscription.recv() => match msg {
                        Some(msg) => registry.handle_message(msg).await,
                        None => break,
                    },
                }
            }
            registry.bus.unsubscribe(subscription.id());
        })
    }

    /// Stop listening, then stop and unbind every known component.
    pub async fn shutdown(&self) {
        let listeners = {
            let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        if let Some(token) = listeners.token {
            token.cancel();
        }
        for task in listeners.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "registry listener task failed");
            }
        }
        self.clear().await;
        info!(host = %self.host.component, "plugin registry shut down");
    }

    /// Broadcast an IDENTIFY request to every reachable component.
    ///
    /// Returns how many subscribers the request was delivered to.
    pub fn identify_all(&self) -> usize {
        let delivered = self.bus.publish(Message::identify_request(
            &self.host,
            Addressing::Broadcast,
        ));
        debug!(delivered, "broadcast identify request");
        delivered
    }

    /// Send an IDENTIFY request to a single component.
    pub fn identify(&self, component: &ComponentAddress) -> usize {
        self.bus.publish(Message::identify_request(
            &self.host,
            Addressing::Explicit(component.clone()),
        ))
    }

    /// Process one bus message. Only IDENTIFY responses are of interest.
    pub async fn handle_message(&self, msg: Message) {
        if msg.kind != Kind::Identify || msg.category != Category::Response {
            debug!(kind = %msg.kind, category = %msg.category, "registry ignored message");
            return;
        }
        match msg.descriptor() {
            Ok(descriptor) => {
                self.discover(descriptor).await;
            }
            Err(e) => {
                warn!(sender = %msg.sender, error = %e, "dropping malformed identify response");
            }
        }
    }

    /// Record an announced descriptor.
    ///
    /// A first sighting takes its enabled flag from the preference store
    /// and runs the matching transition. A re-announcement refreshes the
    /// metadata but keeps the registry's own enabled flag.
    pub async fn discover(&self, mut descriptor: Descriptor) -> Upsert {
        let mut state = self.state.lock().await;
        let component = descriptor.component.clone();

        if let Some(idx) = state.position(&component) {
            descriptor.enabled = state.entries[idx].enabled;
            let outcome = state.upsert(descriptor);
            debug!(component = %component, "plugin re-announced");
            return outcome;
        }

        descriptor.enabled = match self
            .preferences
            .get_enabled(&component, self.default_enabled)
            .await
        {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(component = %component, error = %e, "failed to read plugin preference, using default");
                self.default_enabled
            }
        };
        let enabled = descriptor.enabled;
        let features = descriptor.features;
        info!(component = %component, name = %descriptor.name, %features, enabled, "plugin discovered");
        let outcome = state.upsert(descriptor);

        if enabled {
            self.activate(&mut state, &component, features).await;
        } else {
            self.deactivate(&mut state, &component).await;
        }
        outcome
    }

    /// Insert or replace a descriptor without running any transition.
    pub async fn upsert(&self, descriptor: Descriptor) -> Upsert {
        self.state.lock().await.upsert(descriptor)
    }

    /// Enable or disable a known component.
    ///
    /// Persists the flag, then starts and binds (and triggers ACTION if
    /// declared) on enable, or unbinds and stops on disable. Returns
    /// `false` when the address is unknown.
    pub async fn set_enabled(&self, component: &ComponentAddress, enabled: bool) -> bool {
        let mut state = self.state.lock().await;
        let Some(idx) = state.position(component) else {
            debug!(component = %component, "set_enabled on unknown plugin");
            return false;
        };
        state.entries[idx].enabled = enabled;
        let features = state.entries[idx].features;

        if let Err(e) = self.preferences.set_enabled(component, enabled).await {
            warn!(component = %component, error = %e, "failed to persist plugin preference");
        }
        info!(component = %component, enabled, "plugin enablement changed");

        if enabled {
            self.activate(&mut state, component, features).await;
        } else {
            self.deactivate(&mut state, component).await;
        }
        true
    }

    async fn activate(
        &self,
        state: &mut RegistryState,
        component: &ComponentAddress,
        features: Features,
    ) {
        if !state.bindings.contains_key(component) {
            let start = Message::identify_request(
                &self.host,
                Addressing::Explicit(component.clone()),
            );
            if let Err(e) = self.lifecycle.start(component, &start).await {
                warn!(component = %component, error = %e, "failed to start plugin");
            }
            match self.lifecycle.bind(component).await {
                Ok(handle) => {
                    state.bindings.insert(component.clone(), handle);
                }
                Err(e) => {
                    warn!(component = %component, error = %e, "failed to bind plugin");
                }
            }
        }
        if features.contains(Features::ACTION) {
            self.bus
                .publish(Message::action(self.host.component.clone(), component.clone()));
        }
    }

    async fn deactivate(&self, state: &mut RegistryState, component: &ComponentAddress) {
        if let Some(handle) = state.bindings.remove(component) {
            if let Err(e) = self.lifecycle.unbind(handle).await {
                warn!(component = %component, error = %e, "failed to unbind plugin");
            }
        }
        if let Err(e) = self.lifecycle.stop(component).await {
            warn!(component = %component, error = %e, "failed to stop plugin");
        }
    }

    /// Send ACTION to an enabled component that declared it.
    pub async fn trigger_action(&self, component: &ComponentAddress) -> bool {
        self.trigger(component, Features::ACTION).await
    }

    /// Send CONFIGURE to an enabled component that declared it.
    pub async fn trigger_configure(&self, component: &ComponentAddress) -> bool {
        self.trigger(component, Features::CONFIGURE).await
    }

    async fn trigger(&self, component: &ComponentAddress, feature: Features) -> bool {
        let state = self.state.lock().await;
        let Some(entry) = state.entries.iter().find(|d| &d.component == component) else {
            debug!(component = %component, %feature, "trigger on unknown plugin");
            return false;
        };
        if !entry.enabled || !entry.supports(feature) {
            debug!(
                component = %component,
                %feature,
                enabled = entry.enabled,
                features = %entry.features,
                "trigger suppressed"
            );
            return false;
        }
        let msg = if feature == Features::ACTION {
            Message::action(self.host.component.clone(), component.clone())
        } else {
            Message::configure(self.host.component.clone(), component.clone())
        };
        self.bus.publish(msg);
        true
    }

    /// Send a DATALIST (CSV text) to every enabled entry that declared DATA.
    ///
    /// Returns the number of messages issued.
    pub async fn distribute_list(&self, csv: &str) -> usize {
        self.fan_out(|target| {
            Message::data_list(
                self.host.component.clone(),
                Addressing::Explicit(target),
                csv.to_string(),
            )
        })
        .await
    }

    /// Send a DATA update to every enabled entry that declared DATA.
    pub async fn distribute_update(&self, key: &str, value: &str) -> usize {
        self.fan_out(|target| {
            Message::data_update(
                self.host.component.clone(),
                Addressing::Explicit(target),
                key,
                value,
            )
        })
        .await
    }

    async fn fan_out(&self, make: impl Fn(ComponentAddress) -> Message) -> usize {
        let state = self.state.lock().await;
        let mut issued = 0;
        for entry in state
            .entries
            .iter()
            .filter(|d| d.enabled && d.supports(Features::DATA))
        {
            let delivered = self.bus.publish(make(entry.component.clone()));
            if delivered == 0 {
                debug!(component = %entry.component, "data target not reachable");
            }
            issued += 1;
        }
        issued
    }

    /// Stop and unbind every entry, then empty the registry.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let components: Vec<ComponentAddress> =
            state.entries.iter().map(|d| d.component.clone()).collect();
        for component in &components {
            self.deactivate(&mut state, component).await;
        }
        for (component, handle) in state.bindings.drain().collect::<Vec<_>>() {
            if let Err(e) = self.lifecycle.unbind(handle).await {
                warn!(component = %component, error = %e, "failed to unbind plugin");
            }
        }
        state.entries.clear();
        debug!(cleared = components.len(), "plugin registry cleared");
    }

    /// Copy of the current entries, in discovery order.
    pub async fn snapshot(&self) -> Vec<Descriptor> {
        self.state.lock().await.entries.clone()
    }

    /// Entry for `component`, if discovered.
    pub async fn get(&self, component: &ComponentAddress) -> Option<Descriptor> {
        let state = self.state.lock().await;
        state.position(component).map(|idx| state.entries[idx].clone())
    }

    /// Whether a binding is held for `component`.
    pub async fn is_bound(&self, component: &ComponentAddress) -> bool {
        self.state.lock().await.bindings.contains_key(component)
    }

    /// Number of discovered components.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Whether no component has been discovered.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("host", &self.host.component)
            .field("default_enabled", &self.default_enabled)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
