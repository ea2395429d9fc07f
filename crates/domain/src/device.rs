//! Virtual devices and the bridge-side state model.
//!
//! A [`VirtualDevice`] is a configured binding between one hub entity and one
//! bridge identity. A [`Device`] is its materialized, translated view as held
//! by the device cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::id::{self, HueId};

/// Brightness-like scalar ceiling on the bridge side.
pub const MAX_BRI: u8 = 254;

/// Static JSON fields merged into outgoing hub payloads.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Device type tag selecting the translation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Light,
    Cover,
    Climate,
    Custom,
}

impl DeviceType {
    /// Lowercase tag as stored in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Cover => "cover",
            Self::Climate => "climate",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a device type tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown device type {0:?}")]
pub struct UnknownDeviceType(pub String);

impl FromStr for DeviceType {
    type Err = UnknownDeviceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "cover" => Ok(Self::Cover),
            "climate" => Ok(Self::Climate),
            "custom" => Ok(Self::Custom),
            _ => Err(UnknownDeviceType(s.to_string())),
        }
    }
}

// Unknown tags degrade to the default type so one bad entry never makes the
// whole configuration unreadable.
impl<'de> Deserialize<'de> for DeviceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.and_then(|t| t.parse().ok()).unwrap_or_default())
    }
}

/// Per-device override bundle for custom or complex bindings.
///
/// Every field is optional; empty strings are treated as absent so that
/// documents written by older admin forms behave like missing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Hub value → bridge scalar, an expression in `x`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_hue_formula: Option<String>,
    /// Bridge scalar → hub value, an expression in `x`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_ha_formula: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_effect: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_op_on: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_effect: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_op_off: bool,

    /// Drop `entity_id` from outgoing payloads (scripts, `notify.*`, …).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub omit_entity_id: bool,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl ActionConfig {
    #[must_use]
    pub fn to_hue_formula(&self) -> Option<&str> {
        non_empty(self.to_hue_formula.as_ref())
    }

    #[must_use]
    pub fn to_ha_formula(&self) -> Option<&str> {
        non_empty(self.to_ha_formula.as_ref())
    }

    /// Action name override for the given transition.
    #[must_use]
    pub fn service_for(&self, on: bool) -> Option<&str> {
        non_empty(if on { self.on_service.as_ref() } else { self.off_service.as_ref() })
    }

    /// Static payload for the given transition.
    #[must_use]
    pub fn payload_for(&self, on: bool) -> Option<&Payload> {
        if on { self.on_payload.as_ref() } else { self.off_payload.as_ref() }
    }

    /// Secondary action fired after the primary one.
    #[must_use]
    pub fn effect_for(&self, on: bool) -> Option<&str> {
        non_empty(if on { self.on_effect.as_ref() } else { self.off_effect.as_ref() })
    }

    /// Whether the given transition must not reach the hub at all.
    #[must_use]
    pub fn suppresses(&self, on: bool) -> bool {
        if on { self.no_op_on } else { self.no_op_off }
    }
}

/// A configured binding of one hub entity to one bridge identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDevice {
    /// Assigned by the bridge; `None` until the configuration is saved.
    #[serde(default, with = "id::optional", skip_serializing_if = "Option::is_none")]
    pub hue_id: Option<HueId>,
    pub name: String,
    pub entity_id: String,
    #[serde(rename = "type", default)]
    pub device_type: DeviceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_config: Option<ActionConfig>,
}

impl VirtualDevice {
    /// Create a builder for constructing a [`VirtualDevice`].
    #[must_use]
    pub fn builder() -> VirtualDeviceBuilder {
        VirtualDeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] when no hub entity is bound.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entity_id.trim().is_empty() {
            return Err(ValidationError::EmptyEntityId {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Whether the configured overrides suppress the given transition.
    #[must_use]
    pub fn suppresses(&self, on: bool) -> bool {
        self.action_config.as_ref().is_some_and(|c| c.suppresses(on))
    }

    /// Domain prefix of the bound hub entity (`light` for `light.kitchen`).
    #[must_use]
    pub fn entity_domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }
}

/// Domain prefix of a hub entity reference.
#[must_use]
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split_once('.').map_or(entity_id, |(domain, _)| domain)
}

/// Step-by-step builder for [`VirtualDevice`].
#[derive(Debug, Default)]
pub struct VirtualDeviceBuilder {
    hue_id: Option<HueId>,
    name: Option<String>,
    entity_id: Option<String>,
    device_type: DeviceType,
    action_config: Option<ActionConfig>,
}

impl VirtualDeviceBuilder {
    #[must_use]
    pub fn hue_id(mut self, hue_id: HueId) -> Self {
        self.hue_id = Some(hue_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    #[must_use]
    pub fn action_config(mut self, action_config: ActionConfig) -> Self {
        self.action_config = Some(action_config);
        self
    }

    /// Consume the builder, validate, and return a [`VirtualDevice`].
    ///
    /// A missing name defaults to the entity id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] if no entity id was given.
    pub fn build(self) -> Result<VirtualDevice, ValidationError> {
        let entity_id = self.entity_id.unwrap_or_default();
        let device = VirtualDevice {
            hue_id: self.hue_id,
            name: self.name.unwrap_or_else(|| entity_id.clone()),
            entity_id,
            device_type: self.device_type,
            action_config: self.action_config,
        };
        device.validate()?;
        Ok(device)
    }
}

/// The bridge wire state: on/off, a 0–254 scalar and reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeState {
    pub on: bool,
    pub bri: u8,
    pub reachable: bool,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self {
            on: false,
            bri: 0,
            reachable: true,
        }
    }
}

impl BridgeState {
    /// Apply the fields present in a partial update.
    #[must_use]
    pub fn merged(self, update: &StateUpdate) -> Self {
        Self {
            on: update.on.unwrap_or(self.on),
            bri: update.bri.map_or(self.bri, |bri| bri.min(MAX_BRI)),
            reachable: self.reachable,
        }
    }
}

/// A partial bridge-state write; absent fields keep their cached value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub on: Option<bool>,
    pub bri: Option<u8>,
}

impl StateUpdate {
    /// Whether the update carries no recognized field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.bri.is_none()
    }
}

/// Cache-resident, translated view of a virtual device.
///
/// Callers always receive owned clones; the live instance stays inside the
/// device cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: HueId,
    pub name: String,
    pub device_type: DeviceType,
    pub entity_id: String,
    pub state: BridgeState,
    #[serde(skip)]
    pub virtual_device: VirtualDevice,
}
