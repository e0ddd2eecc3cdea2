// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the bus, endpoints and the registry.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque process/class identifier of one plugin component.
///
/// This is the identity key of a [`Descriptor`](crate::Descriptor): the
/// registry never holds two descriptors with the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentAddress(pub String);

impl ComponentAddress {
    /// Create an address from any string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ComponentAddress {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Message kind carried on the bus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    Identify,
    Configure,
    Action,
    DataList,
    Data,
}

/// Direction of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Request,
    Response,
}

/// Capability bitmask advertised in a descriptor.
///
/// Bit layout: bit0 = CONFIGURE, bit1 = ACTION, bit2 = DATALIST, bit3 = DATA.
/// DATALIST marks a plugin that provides data to the host; DATA marks a
/// plugin that receives the host's data list and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(u8);

impl Features {
    pub const NONE: Features = Features(0);
    pub const CONFIGURE: Features = Features(1 << 0);
    pub const ACTION: Features = Features(1 << 1);
    pub const DATALIST: Features = Features(1 << 2);
    pub const DATA: Features = Features(1 << 3);

    const ALL_BITS: u8 = 0b1111;

    /// Build from raw bits. Bits outside the four known features are dropped.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Features(bits & Self::ALL_BITS)
    }

    /// Build from a wire integer of any width. Unknown and sign bits are
    /// dropped, so only the four known features survive.
    pub const fn from_wire_bits(bits: i64) -> Self {
        Features((bits & Self::ALL_BITS as i64) as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn union(self, other: Features) -> Self {
        Features(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Names of the set bits, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::CONFIGURE, "configure"),
            (Self::ACTION, "action"),
            (Self::DATALIST, "datalist"),
            (Self::DATA, "data"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Features {
    fn bitor_assign(&mut self, rhs: Features) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

/// How a message is routed by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Addressing {
    /// Delivered to every subscriber whose filter matches.
    Broadcast,
    /// Delivered to the one subscriber registered for this address, bypassing filters.
    Explicit(ComponentAddress),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn feature_bits_match_wire_layout() {
        assert_eq!(Features::CONFIGURE.bits(), 0b0001);
        assert_eq!(Features::ACTION.bits(), 0b0010);
        assert_eq!(Features::DATALIST.bits(), 0b0100);
        assert_eq!(Features::DATA.bits(), 0b1000);
    }

    #[test]
    fn contains_requires_every_bit() {
        let f = Features::ACTION | Features::DATA;
        assert!(f.contains(Features::DATA));
        assert!(f.contains(Features::ACTION));
        assert!(!f.contains(Features::CONFIGURE));
        assert!(!f.contains(Features::DATA | Features::CONFIGURE));
        assert!(!f.contains(Features::NONE));
    }

    #[test]
    fn truncate_drops_unknown_bits() {
        assert_eq!(Features::from_bits_truncate(0xF8).bits(), 0b1000);
    }

    #[test]
    fn features_display() {
        assert_eq!(Features::NONE.to_string(), "none");
        assert_eq!(
            (Features::CONFIGURE | Features::DATA).to_string(),
            "configure|data"
        );
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            Kind::Identify,
            Kind::Configure,
            Kind::Action,
            Kind::DataList,
            Kind::Data,
        ] {
            let s = kind.to_string();
            assert_eq!(Kind::from_str(&s).unwrap(), kind);
        }
        assert_eq!(Kind::DataList.to_string(), "DATALIST");
        assert_eq!(Category::Response.to_string(), "RESPONSE");
    }
}
