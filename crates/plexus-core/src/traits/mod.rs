// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams of the Plexus protocol.
//!
//! Capability handlers are implemented by plugin code and declared on an
//! endpoint at construction. The lifecycle manager and preference store are
//! host-side collaborators consumed by the registry. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod handler;
pub mod lifecycle;
pub mod preferences;

pub use handler::{ActionHandler, ConfigurationHandler, DataReceiver};
pub use lifecycle::{BindingHandle, LifecycleManager};
pub use preferences::PreferenceStore;
