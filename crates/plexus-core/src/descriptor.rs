// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor and its key/value wire form.
//!
//! A descriptor travels inside IDENTIFY messages as an order-independent
//! field map. `class` (the component address) and `name` are required;
//! every other field falls back to a default when absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PlexusError;
use crate::types::{ComponentAddress, Features};

/// Field keys of the serialized descriptor.
pub mod field {
    pub const NAME: &str = "name";
    pub const CLASS: &str = "class";
    pub const PACKAGE: &str = "package";
    pub const DESCRIPTION: &str = "description";
    pub const COPYRIGHT: &str = "copyright";
    pub const LICENSE: &str = "license";
    pub const URL: &str = "url";
    pub const ENABLED: &str = "enabled";
    pub const FEATURES: &str = "features";
}

/// Identity, capability and enablement record for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Unique component address; the identity key.
    pub component: ComponentAddress,
    /// Display name.
    pub name: String,
    /// Package/module identifier the component lives in.
    pub package: String,
    pub description: String,
    pub copyright: String,
    pub license: String,
    /// Display-only project URL.
    pub url: String,
    /// Runtime flag; the registry's copy is authoritative.
    pub enabled: bool,
    /// Declared capabilities.
    pub features: Features,
}

impl Descriptor {
    /// Create a descriptor with empty metadata, enabled, and no features.
    pub fn new(name: impl Into<String>, component: impl Into<ComponentAddress>) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
            package: String::new(),
            description: String::new(),
            copyright: String::new(),
            license: String::new(),
            url: String::new(),
            enabled: true,
            features: Features::NONE,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the advertised capability bitmask.
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// True if the descriptor declares every bit of `feature`.
    pub fn supports(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }

    /// Serialize into the IDENTIFY field map.
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert(field::NAME.to_string(), self.name.clone());
        fields.insert(field::CLASS.to_string(), self.component.0.clone());
        fields.insert(field::PACKAGE.to_string(), self.package.clone());
        fields.insert(field::DESCRIPTION.to_string(), self.description.clone());
        fields.insert(field::COPYRIGHT.to_string(), self.copyright.clone());
        fields.insert(field::LICENSE.to_string(), self.license.clone());
        fields.insert(field::URL.to_string(), self.url.clone());
        fields.insert(field::ENABLED.to_string(), self.enabled.to_string());
        fields.insert(field::FEATURES.to_string(), self.features.bits().to_string());
        fields
    }

    /// Parse the IDENTIFY field map.
    ///
    /// Unknown keys are ignored so newer plugins can add fields.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self, PlexusError> {
        let required = |key: &str| -> Result<String, PlexusError> {
            match fields.get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(PlexusError::MalformedDescriptor(format!(
                    "missing required field `{key}`"
                ))),
            }
        };
        let optional = |key: &str| fields.get(key).cloned().unwrap_or_default();

        let component = ComponentAddress(required(field::CLASS)?);
        let name = required(field::NAME)?;

        let enabled = match fields.get(field::ENABLED) {
            None => true,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                PlexusError::MalformedDescriptor(format!(
                    "field `enabled` must be true or false, got `{raw}`"
                ))
            })?,
        };

        let features = match fields.get(field::FEATURES) {
            None => Features::NONE,
            Some(raw) => {
                let bits = raw.trim().parse::<i64>().map_err(|_| {
                    PlexusError::MalformedDescriptor(format!(
                        "field `features` must be an integer bitmask, got `{raw}`"
                    ))
                })?;
                Features::from_wire_bits(bits)
            }
        };

        Ok(Self {
            component,
            name,
            package: optional(field::PACKAGE),
            description: optional(field::DESCRIPTION),
            copyright: optional(field::COPYRIGHT),
            license: optional(field::LICENSE),
            url: optional(field::URL),
            enabled,
            features,
        })
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.component, self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Descriptor {
        Descriptor::new("Sensor Logger", "org.example.logger.LoggerService")
            .with_package("org.example.logger")
            .with_description("Writes received data to disk")
            .with_copyright("(C) 2026 Example")
            .with_license("GPL-3.0-or-later")
            .with_url("https://example.org/logger")
            .with_features(Features::CONFIGURE | Features::DATA)
    }

    #[test]
    fn field_map_round_trip() {
        let d = sample().with_enabled(false);
        let parsed = Descriptor::from_fields(&d.to_fields()).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn features_serialize_as_decimal_bitmask() {
        let fields = sample().to_fields();
        assert_eq!(fields.get("features").map(String::as_str), Some("9"));
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let mut fields = BTreeMap::new();
        fields.insert("class".to_string(), "a.B".to_string());
        fields.insert("name".to_string(), "B".to_string());
        let d = Descriptor::from_fields(&fields).unwrap();
        assert!(d.enabled);
        assert_eq!(d.features, Features::NONE);
        assert!(d.url.is_empty());
    }

    #[test]
    fn missing_class_is_rejected() {
        let mut fields = sample().to_fields();
        fields.remove("class");
        let err = Descriptor::from_fields(&fields).unwrap_err().to_string();
        assert!(err.contains("class"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut fields = sample().to_fields();
        fields.insert("name".to_string(), "   ".to_string());
        assert!(Descriptor::from_fields(&fields).is_err());
    }

    #[test]
    fn non_numeric_features_are_rejected() {
        let mut fields = sample().to_fields();
        fields.insert("features".to_string(), "data".to_string());
        let err = Descriptor::from_fields(&fields).unwrap_err().to_string();
        assert!(err.contains("features"));
    }

    #[test]
    fn wide_features_keep_only_known_bits() {
        let mut fields = sample().to_fields();
        fields.insert("features".to_string(), "264".to_string());
        assert_eq!(Descriptor::from_fields(&fields).unwrap().features, Features::DATA);

        fields.insert("features".to_string(), "-1".to_string());
        assert_eq!(
            Descriptor::from_fields(&fields).unwrap().features.bits(),
            0b1111
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut fields = sample().to_fields();
        fields.insert("version".to_string(), "2.0".to_string());
        assert_eq!(Descriptor::from_fields(&fields).unwrap(), sample());
    }
}
