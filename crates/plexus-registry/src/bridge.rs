// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host data bridge.
//!
//! Lets the host application take part in the data channel as a receiver.
//! The bridge listens on the host's own address, so plugins reach it either
//! by broadcasting DATALIST / DATA or by addressing the host explicitly. It
//! never answers IDENTIFY and therefore never shows up as a plugin.

use std::sync::{Arc, PoisonError, RwLock};

use plexus_bus::{Filter, MessageBus};
use plexus_core::{Category, ComponentAddress, DataReceiver, Kind, Message};
use plexus_endpoint::{Dispatch, forward_data};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Data-channel receiver standing in for the host application.
pub struct HostDataBridge {
    /// Host address the bridge listens on.
    address: ComponentAddress,
    /// External receiver, replaceable at any time.
    receiver: RwLock<Option<Arc<dyn DataReceiver>>>,
}

impl HostDataBridge {
    /// Create a bridge with no receiver attached.
    pub fn new(address: ComponentAddress) -> Self {
        Self {
            address,
            receiver: RwLock::new(None),
        }
    }

    /// Address the bridge subscribes under.
    pub fn address(&self) -> &ComponentAddress {
        &self.address
    }

    /// Replace the external receiver. `None` detaches it; data arriving
    /// without a receiver is discarded.
    pub fn set_receiver(&self, receiver: Option<Arc<dyn DataReceiver>>) {
        *self.receiver.write().unwrap_or_else(PoisonError::into_inner) = receiver;
    }

    /// The currently attached receiver, if any.
    pub fn receiver(&self) -> Option<Arc<dyn DataReceiver>> {
        self.receiver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dispatch one inbound message.
    ///
    /// Only DATALIST and DATA requests are forwarded; everything else is
    /// reported as ignored.
    pub async fn handle(&self, msg: Message) -> Dispatch {
        if msg.category != Category::Request {
            return Dispatch::Ignored(msg.kind);
        }
        match msg.kind {
            Kind::DataList | Kind::Data => match self.receiver() {
                Some(receiver) => forward_data(&self.address, receiver.as_ref(), &msg).await,
                None => {
                    debug!(kind = %msg.kind, sender = %msg.sender, "no host data receiver registered");
                    Dispatch::Ignored(msg.kind)
                }
            },
            Kind::Identify => {
                debug!(sender = %msg.sender, "host data bridge absorbed identify request");
                Dispatch::Ignored(Kind::Identify)
            }
            other => Dispatch::Ignored(other),
        }
    }

    /// Subscribe and pump messages until `token` is cancelled.
    pub(crate) fn spawn(self: &Arc<Self>, bus: &MessageBus, token: CancellationToken) -> JoinHandle<()> {
        let mut subscription = bus.subscribe(
            Some(self.address.clone()),
            Filter::new()
                .kind(Kind::DataList)
                .kind(Kind::Data)
                .category(Category::Request),
        );
        let bridge = Arc::clone(self);
        let bus = bus.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    msg = subscription.recv() => match msg {
                        Some(msg) => {
                            bridge.handle(msg).await;
                        }
                        None => break,
                    },
                }
            }
            bus.unsubscribe(subscription.id());
        })
    }
}

impl std::fmt::Debug for HostDataBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostDataBridge")
            .field("address", &self.address)
            .field("receiver", &self.receiver().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plexus_core::{Addressing, DataRecord, Descriptor, PlexusError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink {
        lists: Mutex<Vec<Vec<DataRecord>>>,
        updates: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DataReceiver for Sink {
        async fn on_data_list(&self, records: Vec<DataRecord>) -> Result<(), PlexusError> {
            self.lists.lock().unwrap().push(records);
            Ok(())
        }

        async fn on_data_update(&self, key: &str, value: &str) -> Result<(), PlexusError> {
            self.updates
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn bridge_with_sink() -> (HostDataBridge, Arc<Sink>) {
        let bridge = HostDataBridge::new("host.Main".into());
        let sink = Arc::new(Sink::default());
        bridge.set_receiver(Some(sink.clone()));
        (bridge, sink)
    }

    #[tokio::test]
    async fn forwards_updates_and_lists() {
        let (bridge, sink) = bridge_with_sink();
        let update = Message::data_update("p.A".into(), Addressing::Broadcast, "rpm", "3200");
        assert_eq!(bridge.handle(update).await, Dispatch::Handled(Kind::Data));

        let list = Message::data_list(
            "p.A".into(),
            Addressing::Broadcast,
            "rpm;Engine RPM;0;8000;rpm".to_string(),
        );
        assert_eq!(bridge.handle(list).await, Dispatch::Handled(Kind::DataList));

        assert_eq!(
            *sink.updates.lock().unwrap(),
            vec![("rpm".to_string(), "3200".to_string())]
        );
        assert_eq!(sink.lists.lock().unwrap()[0][0].key, "rpm");
    }

    #[tokio::test]
    async fn identify_is_absorbed_without_reply() {
        let bus = MessageBus::new();
        let mut listener = bus.subscribe(None, Filter::only(Kind::Identify, Category::Response));
        let (bridge, _sink) = bridge_with_sink();
        let request = Message::identify_request(
            &Descriptor::new("Other", "p.Other"),
            Addressing::Explicit("host.Main".into()),
        );
        assert_eq!(bridge.handle(request).await, Dispatch::Ignored(Kind::Identify));
        assert!(listener.try_recv().is_none());
    }

    #[tokio::test]
    async fn data_without_receiver_is_discarded() {
        let bridge = HostDataBridge::new("host.Main".into());
        let update = Message::data_update("p.A".into(), Addressing::Broadcast, "rpm", "1");
        assert_eq!(bridge.handle(update).await, Dispatch::Ignored(Kind::Data));
    }

    #[tokio::test]
    async fn spawned_bridge_receives_broadcast_data() {
        let bus = MessageBus::new();
        let (bridge, sink) = bridge_with_sink();
        let bridge = Arc::new(bridge);
        let token = CancellationToken::new();
        let join = bridge.spawn(&bus, token.clone());

        bus.publish(Message::data_update("p.A".into(), Addressing::Broadcast, "speed", "88"));
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while sink.updates.lock().unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("bridge did not forward the update");

        token.cancel();
        join.await.unwrap();
        assert!(!bus.is_reachable(bridge.address()));
    }
}
