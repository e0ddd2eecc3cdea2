// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin endpoint.
//!
//! An [`Endpoint`] owns one plugin's descriptor and the capability handlers
//! the plugin declared at construction. The advertised feature bitmask is
//! derived from that declared set, so dispatch never has to guess what the
//! plugin supports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use plexus_bus::{Filter, MessageBus};
use plexus_core::codec::encode_data_list;
use plexus_core::{
    ActionHandler, Addressing, Category, ComponentAddress, ConfigurationHandler, DataReceiver,
    DataRecord, Descriptor, Features, Kind, Message, PlexusError,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::forward_data;

/// Outcome of dispatching one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// IDENTIFY request answered.
    Identified,
    /// A declared capability handled the message.
    Handled(Kind),
    /// The handler ran and returned an error.
    Failed(Kind),
    /// The payload was malformed and the message was dropped.
    Rejected(Kind),
    /// No declared capability for this kind, or not a request.
    Ignored(Kind),
}

/// Capability handlers declared by a plugin.
#[derive(Default, Clone)]
pub struct Capabilities {
    configure: Option<Arc<dyn ConfigurationHandler>>,
    action: Option<Arc<dyn ActionHandler>>,
    receiver: Option<Arc<dyn DataReceiver>>,
    provides_data: bool,
}

impl Capabilities {
    /// Feature bitmask implied by the declared handlers.
    pub fn features(&self) -> Features {
        let mut features = Features::NONE;
        if self.configure.is_some() {
            features |= Features::CONFIGURE;
        }
        if self.action.is_some() {
            features |= Features::ACTION;
        }
        if self.provides_data {
            features |= Features::DATALIST;
        }
        if self.receiver.is_some() {
            features |= Features::DATA;
        }
        features
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("features", &self.features())
            .finish()
    }
}

/// Builder declaring a plugin's capabilities.
pub struct EndpointBuilder {
    descriptor: Descriptor,
    capabilities: Capabilities,
}

impl EndpointBuilder {
    /// Declare the CONFIGURE capability.
    pub fn configure(mut self, handler: Arc<dyn ConfigurationHandler>) -> Self {
        self.capabilities.configure = Some(handler);
        self
    }

    /// Declare the ACTION capability.
    pub fn action(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.capabilities.action = Some(handler);
        self
    }

    /// Declare the DATA capability: receive the host's records and updates.
    pub fn data_receiver(mut self, receiver: Arc<dyn DataReceiver>) -> Self {
        self.capabilities.receiver = Some(receiver);
        self
    }

    /// Declare that this plugin sends DATALIST / DATA to the host.
    pub fn data_provider(mut self) -> Self {
        self.capabilities.provides_data = true;
        self
    }

    /// Finish the endpoint on `bus`. Nothing is subscribed until `spawn`.
    pub fn build(self, bus: MessageBus) -> Arc<Endpoint> {
        let mut descriptor = self.descriptor;
        descriptor.features = self.capabilities.features();
        Arc::new(Endpoint {
            descriptor,
            capabilities: self.capabilities,
            bus,
            host_info: RwLock::new(None),
            header_sent: AtomicBool::new(false),
        })
    }
}

/// Plugin-side protocol logic.
pub struct Endpoint {
    descriptor: Descriptor,
    capabilities: Capabilities,
    bus: MessageBus,
    host_info: RwLock<Option<Descriptor>>,
    header_sent: AtomicBool,
}

impl Endpoint {
    /// Start declaring an endpoint. Any features already set on `descriptor`
    /// are replaced by the ones implied by the declared handlers.
    pub fn builder(descriptor: Descriptor) -> EndpointBuilder {
        EndpointBuilder {
            descriptor,
            capabilities: Capabilities::default(),
        }
    }

    /// Descriptor sent in IDENTIFY responses.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn address(&self) -> &ComponentAddress {
        &self.descriptor.component
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Descriptor of the last host that sent an IDENTIFY request.
    pub fn host_info(&self) -> Option<Descriptor> {
        self.host_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the data list was already sent this session.
    pub fn header_sent(&self) -> bool {
        self.header_sent.load(Ordering::Acquire)
    }

    /// Dispatch one inbound message to the declared capabilities.
    pub async fn handle(&self, msg: Message) -> Dispatch {
        if msg.category != Category::Request {
            return Dispatch::Ignored(msg.kind);
        }

        match msg.kind {
            Kind::Identify => self.handle_identify(&msg),
            Kind::Configure => match &self.capabilities.configure {
                Some(handler) => {
                    debug!(component = %self.address(), "configure requested");
                    match handler.perform_configure().await {
                        Ok(()) => Dispatch::Handled(Kind::Configure),
                        Err(e) => {
                            warn!(component = %self.address(), error = %e, "configure handler failed");
                            Dispatch::Failed(Kind::Configure)
                        }
                    }
                }
                None => Dispatch::Ignored(Kind::Configure),
            },
            Kind::Action => match &self.capabilities.action {
                Some(handler) => {
                    debug!(component = %self.address(), "action requested");
                    match handler.perform_action().await {
                        Ok(()) => Dispatch::Handled(Kind::Action),
                        Err(e) => {
                            warn!(component = %self.address(), error = %e, "action handler failed");
                            Dispatch::Failed(Kind::Action)
                        }
                    }
                }
                None => Dispatch::Ignored(Kind::Action),
            },
            Kind::DataList | Kind::Data => match &self.capabilities.receiver {
                Some(receiver) => forward_data(self.address(), receiver.as_ref(), &msg).await,
                None => Dispatch::Ignored(msg.kind),
            },
        }
    }

    fn handle_identify(&self, msg: &Message) -> Dispatch {
        match msg.descriptor() {
            Ok(host) => {
                debug!(component = %self.address(), host = %host.component, "identify request");
                *self.host_info.write().unwrap_or_else(PoisonError::into_inner) = Some(host);
            }
            Err(e) => {
                warn!(component = %self.address(), sender = %msg.sender, error = %e, "identify request without usable host descriptor");
            }
        }

        // A fresh IDENTIFY means the host may have restarted and lost the list.
        self.header_sent.store(false, Ordering::Release);
        self.bus.publish(Message::identify_response(&self.descriptor));
        Dispatch::Identified
    }

    fn require_provider(&self) -> Result<(), PlexusError> {
        if self.capabilities.provides_data {
            Ok(())
        } else {
            Err(PlexusError::CapabilityMissing {
                component: self.address().clone(),
                capability: "data provider",
            })
        }
    }

    /// Broadcast the full data list, once per session.
    ///
    /// Returns `Ok(false)` when the list was already sent since the last
    /// IDENTIFY request.
    pub fn send_data_list(&self, records: &[DataRecord]) -> Result<bool, PlexusError> {
        self.require_provider()?;
        if self
            .header_sent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(component = %self.address(), "data list already sent this session");
            return Ok(false);
        }

        let delivered = self.bus.publish(Message::data_list(
            self.address().clone(),
            Addressing::Broadcast,
            encode_data_list(records),
        ));
        debug!(component = %self.address(), records = records.len(), delivered, "data list sent");
        Ok(true)
    }

    /// Broadcast one value change. Never suppressed.
    pub fn send_data_update(&self, key: &str, value: &str) -> Result<usize, PlexusError> {
        self.require_provider()?;
        Ok(self.bus.publish(Message::data_update(
            self.address().clone(),
            Addressing::Broadcast,
            key,
            value,
        )))
    }

    /// Run this endpoint as a long-lived task.
    ///
    /// The subscription is registered before this returns, so messages
    /// published afterwards are never missed. The task holds the
    /// subscription until cancelled. Cancellation also drops a handler
    /// that is still running.
    pub fn spawn(self: &Arc<Self>) -> EndpointHandle {
        let mut subscription = self.bus.subscribe(
            Some(self.address().clone()),
            Filter::only(Kind::Identify, Category::Request),
        );
        let token = CancellationToken::new();
        let endpoint = Arc::clone(self);
        let task_token = token.clone();

        info!(component = %self.address(), features = %self.descriptor.features, "endpoint started");
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    msg = subscription.recv() => match msg {
                        Some(msg) => {
                            let kind = msg.kind;
                            tokio::select! {
                                () = task_token.cancelled() => {
                                    debug!(component = %endpoint.address(), kind = %kind, "in-flight handler cancelled");
                                    break;
                                }
                                _ = endpoint.handle(msg) => {}
                            }
                        }
                        None => break,
                    },
                }
            }
            endpoint.bus.unsubscribe(subscription.id());
            info!(component = %endpoint.address(), "endpoint stopped");
        });

        EndpointHandle {
            component: self.address().clone(),
            token,
            join,
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("descriptor", &self.descriptor)
            .field("header_sent", &self.header_sent())
            .finish()
    }
}

/// Control handle of a running endpoint task.
pub struct EndpointHandle {
    component: ComponentAddress,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl EndpointHandle {
    /// Address of the endpoint this handle controls.
    pub fn component(&self) -> &ComponentAddress {
        &self.component
    }

    /// Token that stops the task when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the task and wait until it released its subscription.
    ///
    /// Returns promptly even while a capability handler is busy.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.join.await {
            warn!(component = %self.component, error = %e, "endpoint task ended abnormally");
        }
    }
}
