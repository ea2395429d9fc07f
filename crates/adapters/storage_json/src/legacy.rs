//! One-way migration from the flat `entity_mappings` layout.
//!
//! The old document kept a dictionary keyed by entity id, with an `exposed`
//! flag deciding whether the entity was visible to the bridge. Only exposed
//! entries survive; the flag itself has no counterpart in the device list.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use huemu_domain::config::BridgeConfig;
use huemu_domain::device::{ActionConfig, DeviceType, VirtualDevice};
use huemu_domain::id::{self, HueId};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyDocument {
    #[serde(alias = "hub_url")]
    hass_url: String,
    #[serde(alias = "hub_token")]
    hass_token: String,
    local_ip: Option<String>,
    entity_mappings: HashMap<String, LegacyMapping>,
}

#[derive(Debug, Deserialize)]
struct LegacyMapping {
    #[serde(default)]
    entity_id: String,
    #[serde(default, deserialize_with = "id::optional::deserialize")]
    hue_id: Option<HueId>,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    device_type: DeviceType,
    #[serde(default)]
    exposed: bool,
    #[serde(default)]
    custom_formula: Option<LegacyFormula>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyFormula {
    to_hue_formula: String,
    to_ha_formula: String,
    on_service: String,
    off_service: String,
    on_effect: String,
    off_effect: String,
}

fn text(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

impl From<LegacyFormula> for ActionConfig {
    fn from(formula: LegacyFormula) -> Self {
        Self {
            to_hue_formula: text(formula.to_hue_formula),
            to_ha_formula: text(formula.to_ha_formula),
            on_service: text(formula.on_service),
            off_service: text(formula.off_service),
            on_effect: text(formula.on_effect),
            off_effect: text(formula.off_effect),
            ..Self::default()
        }
    }
}

/// Rebuild a configuration from a legacy document.
///
/// Returns `None` when the document has no mappings to migrate.
pub(crate) fn migrate(document: &[u8]) -> Option<BridgeConfig> {
    let legacy: LegacyDocument = serde_json::from_slice(document).ok()?;
    if legacy.entity_mappings.is_empty() {
        return None;
    }

    let mut devices: Vec<VirtualDevice> = legacy
        .entity_mappings
        .into_iter()
        .filter(|(_, mapping)| mapping.exposed)
        .map(|(key, mapping)| {
            let entity_id = if mapping.entity_id.trim().is_empty() {
                key
            } else {
                mapping.entity_id
            };
            let name = if mapping.name.trim().is_empty() {
                entity_id.clone()
            } else {
                mapping.name
            };
            VirtualDevice {
                hue_id: mapping.hue_id,
                name,
                entity_id,
                device_type: mapping.device_type,
                action_config: mapping.custom_formula.map(ActionConfig::from),
            }
        })
        .filter(|device| !device.entity_id.trim().is_empty())
        .collect();
    devices.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    // first holder keeps a contested id, the others get fresh ones
    let mut seen = HashSet::new();
    for device in &mut devices {
        if let Some(hue_id) = device.hue_id
            && !seen.insert(hue_id)
        {
            device.hue_id = None;
        }
    }

    let mut config = BridgeConfig {
        hub_url: legacy.hass_url,
        hub_token: legacy.hass_token,
        local_ip: legacy.local_ip.and_then(text),
        virtual_devices: devices,
    };
    config.assign_missing_hue_ids(None);
    Some(config)
}
