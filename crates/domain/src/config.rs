//! Bridge configuration: hub connection settings plus the ordered list of
//! virtual devices.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::device::VirtualDevice;
use crate::error::ValidationError;
use crate::id::HueId;

/// Connection settings for the upstream hub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubSettings {
    pub url: String,
    pub token: String,
}

impl HubSettings {
    #[must_use]
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }

    /// Whether both the URL and the token are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.token.trim().is_empty()
    }
}

/// The full bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    #[serde(alias = "hass_url")]
    pub hub_url: String,
    #[serde(alias = "hass_token")]
    pub hub_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
    pub virtual_devices: Vec<VirtualDevice>,
}

impl BridgeConfig {
    #[must_use]
    pub fn hub_settings(&self) -> HubSettings {
        HubSettings::new(self.hub_url.trim(), self.hub_token.trim())
    }

    /// Highest identifier currently assigned, if any.
    #[must_use]
    pub fn max_hue_id(&self) -> Option<HueId> {
        self.virtual_devices.iter().filter_map(|d| d.hue_id).max()
    }

    /// Give every device lacking an identifier a fresh one, strictly above
    /// both `floor` and every identifier already present.
    ///
    /// Returns the number of identifiers assigned.
    pub fn assign_missing_hue_ids(&mut self, floor: Option<HueId>) -> usize {
        let mut last = self.max_hue_id().max(floor).unwrap_or(HueId::new(0));
        let mut assigned = 0;
        for device in self.virtual_devices.iter_mut().filter(|d| d.hue_id.is_none()) {
            last = last.next();
            device.hue_id = Some(last);
            assigned += 1;
        }
        assigned
    }

    /// Carry identifiers over from `previous` to id-less devices bound to the
    /// same entity under the same name, unless that id is already taken.
    pub fn inherit_hue_ids(&mut self, previous: &BridgeConfig) {
        let mut taken: HashSet<HueId> = self.virtual_devices.iter().filter_map(|d| d.hue_id).collect();
        for device in self.virtual_devices.iter_mut().filter(|d| d.hue_id.is_none()) {
            let inherited = previous
                .virtual_devices
                .iter()
                .filter(|p| p.entity_id == device.entity_id && p.name == device.name)
                .find_map(|p| p.hue_id.filter(|id| !taken.contains(id)));
            if let Some(id) = inherited {
                taken.insert(id);
                device.hue_id = Some(id);
            }
        }
    }

    /// Check configuration-wide invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityId`] for an unbound device and
    /// [`ValidationError::DuplicateHueId`] when two devices share an id.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for device in &self.virtual_devices {
            device.validate()?;
            if let Some(id) = device.hue_id
                && !seen.insert(id)
            {
                return Err(ValidationError::DuplicateHueId(id));
            }
        }
        Ok(())
    }
}
