// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for plugin enablement preferences.

pub mod database;
pub mod preferences;

pub use database::Database;
pub use preferences::SqlitePreferences;
