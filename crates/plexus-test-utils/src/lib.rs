// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plexus integration tests.
//!
//! # Components
//!
//! - [`MockLifecycle`] - records start/bind/unbind/stop calls, can be told to fail
//! - [`RecordingReceiver`] - captures data lists and updates
//! - [`RecordingHandler`] - counts CONFIGURE and ACTION invocations
//! - [`TestHarness`] - bus + registry + preferences wired together

pub mod harness;
pub mod mock_lifecycle;
pub mod recording;

pub use harness::{TestHarness, TestHarnessBuilder, eventually};
pub use mock_lifecycle::{LifecycleCall, MockLifecycle};
pub use recording::{RecordingHandler, RecordingReceiver};
