// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message bus.
//!
//! Every subscriber owns an unbounded channel; `publish` clones the message
//! into each matching channel and returns immediately. Nothing is queued for
//! targets that are not subscribed, and nothing is retried.

use std::sync::{Arc, PoisonError, RwLock};

use plexus_core::{Addressing, ComponentAddress, Message};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::filter::Filter;

/// Identifier returned by [`MessageBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiving half of a subscription.
///
/// Dropping it is equivalent to unsubscribing: the bus prunes closed
/// channels on the next publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    /// Identifier to pass to `MessageBus::unsubscribe`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next message. Returns `None` once the subscription was
    /// removed from the bus.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Take a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }
}

struct Subscriber {
    id: SubscriptionId,
    address: Option<ComponentAddress>,
    filter: Filter,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct BusState {
    subscribers: Vec<Subscriber>,
}

/// Cloneable handle to one shared bus.
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Arc<RwLock<BusState>>,
}

impl MessageBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    ///
    /// `address` makes the subscriber reachable by explicit messages. At most
    /// one live subscription owns an address: subscribing again with the same
    /// address replaces (and closes) the previous one.
    pub fn subscribe(&self, address: Option<ComponentAddress>, filter: Filter) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SubscriptionId(Uuid::new_v4());

        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(addr) = &address {
            let before = state.subscribers.len();
            state
                .subscribers
                .retain(|s| s.address.as_ref() != Some(addr));
            if state.subscribers.len() != before {
                debug!(component = %addr, "replacing existing subscription");
            }
        }
        state.subscribers.push(Subscriber {
            id,
            address: address.clone(),
            filter,
            sender,
        });
        debug!(subscription = %id, component = ?address.as_ref().map(|a| a.as_str()), "subscribed");

        Subscription { id, receiver }
    }

    /// Remove a listener. Returns whether it was still registered; unknown
    /// ids are not an error.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != id);
        let removed = state.subscribers.len() != before;
        if removed {
            debug!(subscription = %id, "unsubscribed");
        }
        removed
    }

    /// Deliver `msg` and return how many subscribers received it.
    ///
    /// Broadcasts go to every subscriber whose filter matches. Explicit
    /// messages go to the subscriber owning the target address regardless of
    /// its filter; an absent target yields 0.
    pub fn publish(&self, msg: Message) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            match &msg.addressing {
                Addressing::Explicit(target) => {
                    let recipient = state
                        .subscribers
                        .iter()
                        .find(|s| s.address.as_ref() == Some(target));
                    match recipient {
                        Some(sub) => {
                            if sub.sender.send(msg.clone()).is_ok() {
                                delivered += 1;
                            } else {
                                closed.push(sub.id);
                            }
                        }
                        None => {
                            trace!(component = %target, kind = %msg.kind, "no subscriber for explicit message");
                        }
                    }
                }
                Addressing::Broadcast => {
                    for sub in state
                        .subscribers
                        .iter()
                        .filter(|s| s.filter.matches(msg.kind, msg.category))
                    {
                        if sub.sender.send(msg.clone()).is_ok() {
                            delivered += 1;
                        } else {
                            closed.push(sub.id);
                        }
                    }
                }
            }
        }

        if !closed.is_empty() {
            let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            state.subscribers.retain(|s| !closed.contains(&s.id));
        }

        trace!(
            kind = %msg.kind,
            category = %msg.category,
            sender = %msg.sender,
            delivered,
            "published"
        );
        delivered
    }

    /// Number of registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }

    /// True if some live subscription owns `address`.
    pub fn is_reachable(&self, address: &ComponentAddress) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .iter()
            .any(|s| s.address.as_ref() == Some(address) && !s.sender.is_closed())
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::{Category, Descriptor, Kind};

    fn host() -> Descriptor {
        Descriptor::new("Host", "host.Main")
    }

    fn identify_requests() -> Filter {
        Filter::only(Kind::Identify, Category::Request)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_matching_subscriber() {
        let bus = MessageBus::new();
        let mut a = bus.subscribe(Some("p.A".into()), identify_requests());
        let mut b = bus.subscribe(Some("p.B".into()), identify_requests());
        let mut other = bus.subscribe(None, Filter::only(Kind::Data, Category::Request));

        let n = bus.publish(Message::identify_request(&host(), Addressing::Broadcast));
        assert_eq!(n, 2);
        assert_eq!(a.recv().await.unwrap().kind, Kind::Identify);
        assert_eq!(b.recv().await.unwrap().kind, Kind::Identify);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn explicit_message_bypasses_filter() {
        let bus = MessageBus::new();
        let mut a = bus.subscribe(Some("p.A".into()), Filter::new());
        let mut b = bus.subscribe(Some("p.B".into()), Filter::new());

        let n = bus.publish(Message::action("host".into(), "p.A".into()));
        assert_eq!(n, 1);
        assert_eq!(a.recv().await.unwrap().kind, Kind::Action);
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn explicit_message_to_absent_target_is_dropped() {
        let bus = MessageBus::new();
        let _a = bus.subscribe(Some("p.A".into()), Filter::new());
        assert_eq!(bus.publish(Message::action("host".into(), "p.Z".into())), 0);
    }

    #[test]
    fn unsubscribe_is_safe_for_unknown_and_repeated_ids() {
        let bus = MessageBus::new();
        let sub = bus.subscribe(None, identify_requests());
        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(SubscriptionId(Uuid::new_v4())));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let bus = MessageBus::new();
        let sub = bus.subscribe(Some("p.A".into()), identify_requests());
        drop(sub);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            bus.publish(Message::identify_request(&host(), Addressing::Broadcast)),
            0
        );
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn resubscribing_an_address_closes_the_old_subscription() {
        let bus = MessageBus::new();
        let mut old = bus.subscribe(Some("p.A".into()), Filter::new());
        let mut new = bus.subscribe(Some("p.A".into()), Filter::new());
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(Message::action("host".into(), "p.A".into()));
        assert!(old.recv().await.is_none());
        assert!(new.recv().await.is_some());
    }

    #[test]
    fn reachability_tracks_live_subscriptions() {
        let bus = MessageBus::new();
        let addr = ComponentAddress::from("p.A");
        assert!(!bus.is_reachable(&addr));
        let sub = bus.subscribe(Some(addr.clone()), Filter::new());
        assert!(bus.is_reachable(&addr));
        bus.unsubscribe(sub.id());
        assert!(!bus.is_reachable(&addr));
    }

    #[test]
    fn publish_is_usable_from_sync_contexts() {
        let bus = MessageBus::new();
        let mut sub = bus.subscribe(None, identify_requests());
        bus.publish(Message::identify_request(&host(), Addressing::Broadcast));
        let msg = tokio_test::block_on(sub.recv()).unwrap();
        assert_eq!(msg.sender, host().component);
    }
}
