// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plexus plugin protocol.

use thiserror::Error;

use crate::types::{ComponentAddress, Kind};

/// The primary error type used across all Plexus crates.
#[derive(Debug, Error)]
pub enum PlexusError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Preference storage errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A DATA or DATALIST payload could not be decoded as a whole.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload { kind: Kind, reason: String },

    /// One line of a DATALIST payload was rejected.
    #[error("malformed data record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// An IDENTIFY payload did not describe a valid descriptor.
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),

    /// An operation required a capability the component did not declare.
    #[error("component {component} does not declare the {capability} capability")]
    CapabilityMissing {
        component: ComponentAddress,
        capability: &'static str,
    },

    /// The lifecycle collaborator failed to start, bind, unbind or stop a component.
    #[error("lifecycle error for {component}: {message}")]
    Lifecycle {
        component: ComponentAddress,
        message: String,
    },

    /// A plugin capability handler reported a failure.
    #[error("handler error in {component}: {message}")]
    Handler {
        component: ComponentAddress,
        message: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
