//! Bridge identifiers.
//!
//! The emulated protocol addresses lights by small integers encoded as
//! strings (`"1"`, `"2"`, …). [`HueId`] keeps the numeric value so ordering
//! and "next free id" are cheap, and serializes back to the string form.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Stable bridge-visible identifier of a virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HueId(u32);

impl HueId {
    /// Wrap a raw numeric identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Access the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// The identifier directly above this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for HueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for HueId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| ValidationError::InvalidHueId(s.to_string()))
    }
}

impl Serialize for HueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HueId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HueIdVisitor)
    }
}

struct HueIdVisitor;

impl Visitor<'_> for HueIdVisitor {
    type Value = HueId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bridge id as a numeric string or integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        u32::try_from(v)
            .map(HueId)
            .map_err(|_| E::custom(format!("bridge id {v} out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u32::try_from(v)
            .map(HueId)
            .map_err(|_| E::custom(format!("bridge id {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

/// Serde helper for `Option<HueId>` fields where older documents store a
/// missing identifier as an empty string.
pub mod optional {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::HueId;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(HueId),
        Text(String),
    }

    /// Serialize `None` as an absent value (`null`).
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<HueId>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    /// Accept `null`, `""`, a numeric string or an integer.
    ///
    /// # Errors
    ///
    /// Fails on non-numeric, non-empty strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<HueId>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Id(id)) => Ok(Some(id)),
            Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(Raw::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
