// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin-side endpoint for the Plexus protocol.
//!
//! An endpoint answers IDENTIFY requests, dispatches CONFIGURE / ACTION /
//! DATALIST / DATA requests to whichever capability handlers the plugin
//! declared, and publishes the plugin's own data list and updates.

pub mod data;
pub mod endpoint;

pub use data::forward_data;
pub use endpoint::{Capabilities, Dispatch, Endpoint, EndpointBuilder, EndpointHandle};
