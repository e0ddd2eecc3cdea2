// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process message bus for the Plexus plugin protocol.
//!
//! Delivery is fire-and-forget with two addressing modes: broadcast
//! (evaluated against every subscriber's [`Filter`]) and explicit (delivered
//! to the single subscriber that owns the target address).

pub mod bus;
pub mod filter;

pub use bus::{MessageBus, Subscription, SubscriptionId};
pub use filter::Filter;
