// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side plugin registry for Plexus.
//!
//! Discovers plugin endpoints over the message bus, persists and applies
//! their enablement, drives their lifecycle, and distributes host data to
//! the plugins that accept it. The [`HostDataBridge`] lets the host itself
//! receive data published by plugins.

pub mod bridge;
pub mod preferences;
pub mod registry;

pub use bridge::HostDataBridge;
pub use preferences::MemoryPreferences;
pub use registry::{PluginRegistry, Upsert};
