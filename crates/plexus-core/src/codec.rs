// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV codec for the data channel.
//!
//! A DATALIST payload holds one `mnemonic;description;min;max;units` line per
//! record. A DATA payload holds a single `key=value` pair. Nothing is escaped:
//! field values must not contain `;`, `=` or line breaks.

use serde::{Deserialize, Serialize};

use crate::error::PlexusError;
use crate::types::Kind;

/// Field separator within a DATALIST line.
pub const FIELD_SEPARATOR: char = ';';
/// Separator between key and value in a DATA payload.
pub const UPDATE_SEPARATOR: char = '=';
/// Number of fields per DATALIST line.
pub const RECORD_FIELDS: usize = 5;

/// One row of the data channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Mnemonic key, unique within one list.
    pub key: String,
    pub description: String,
    pub min: String,
    pub max: String,
    pub units: String,
    /// Current value; not part of the DATALIST line.
    #[serde(default)]
    pub value: Option<String>,
}

impl DataRecord {
    /// Create a record with no current value.
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        min: impl Into<String>,
        max: impl Into<String>,
        units: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            min: min.into(),
            max: max.into(),
            units: units.into(),
            value: None,
        }
    }

    /// Attach the latest DATA value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    fn to_line(&self) -> String {
        [
            self.key.as_str(),
            self.description.as_str(),
            self.min.as_str(),
            self.max.as_str(),
            self.units.as_str(),
        ]
        .join(";")
    }
}

/// Result of decoding a DATALIST payload.
///
/// Lines with the wrong field count end up in `rejected`; they never prevent
/// the other lines from decoding.
#[derive(Debug, Default)]
pub struct DecodedList {
    pub records: Vec<DataRecord>,
    pub rejected: Vec<PlexusError>,
}

impl DecodedList {
    /// Whether every line decoded.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Encode records as DATALIST CSV, one line per record, in input order.
pub fn encode_data_list(records: &[DataRecord]) -> String {
    records
        .iter()
        .map(DataRecord::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode DATALIST CSV. Blank lines are skipped; line numbers are 1-based.
pub fn decode_data_list(payload: &str) -> DecodedList {
    let mut decoded = DecodedList::default();

    for (idx, line) in payload.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != RECORD_FIELDS {
            decoded.rejected.push(PlexusError::MalformedRecord {
                line: idx + 1,
                reason: format!(
                    "expected {RECORD_FIELDS} fields, found {}",
                    fields.len()
                ),
            });
            continue;
        }
        decoded.records.push(DataRecord::new(
            fields[0], fields[1], fields[2], fields[3], fields[4],
        ));
    }

    decoded
}

/// Encode one DATA update.
pub fn encode_data_update(key: &str, value: &str) -> String {
    format!("{key}{UPDATE_SEPARATOR}{value}")
}

/// Decode one DATA update, splitting on the first `=`.
pub fn decode_data_update(payload: &str) -> Result<(String, String), PlexusError> {
    payload
        .split_once(UPDATE_SEPARATOR)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| PlexusError::MalformedPayload {
            kind: Kind::Data,
            reason: format!("no `{UPDATE_SEPARATOR}` in `{payload}`"),
        })
}
