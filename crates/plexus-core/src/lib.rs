// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plexus plugin protocol.
//!
//! This crate provides the descriptor and message model, the CSV data-channel
//! codec, the workspace error type, and the trait seams (capability handlers,
//! lifecycle manager, preference store) shared by the bus, endpoints and the
//! registry.

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod message;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use codec::{DataRecord, DecodedList};
pub use descriptor::Descriptor;
pub use error::PlexusError;
pub use message::{Message, Payload};
pub use types::{Addressing, Category, ComponentAddress, Features, Kind};

pub use traits::{
    ActionHandler, BindingHandle, ConfigurationHandler, DataReceiver, LifecycleManager,
    PreferenceStore,
};
