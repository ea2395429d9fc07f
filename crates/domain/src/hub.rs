//! Hub-side shapes: raw entity states and outbound actions.

use serde::{Deserialize, Serialize};

use crate::device::{Payload, entity_domain};

/// Status string the hub reports for entities it cannot reach.
pub const UNAVAILABLE: &str = "unavailable";

/// A raw, free-form entity state as reported by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Payload,
}

impl RawEntityState {
    /// Synthetic state used when the hub has no entity for a binding.
    #[must_use]
    pub fn unavailable(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: UNAVAILABLE.to_string(),
            attributes: Payload::new(),
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.state == UNAVAILABLE
    }

    /// Numeric attribute value, accepting numbers and numeric strings.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(serde_json::Value::as_str)
    }
}

/// One outbound hub action: a service name and its JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HubAction {
    /// Either qualified (`camera.record`) or bare (`turn_on`).
    pub service: String,
    pub data: Payload,
}

impl HubAction {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            data: Payload::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Resolve the `(domain, service)` pair to invoke for `entity_id`.
    ///
    /// Bare names use the entity's domain prefix; entities without a prefix
    /// fall back to the hub-wide `homeassistant` domain.
    #[must_use]
    pub fn target<'a>(&'a self, entity_id: &'a str) -> (&'a str, &'a str) {
        if let Some((domain, service)) = self.service.split_once('.') {
            return (domain, service);
        }
        let domain = if entity_id.contains('.') {
            entity_domain(entity_id)
        } else {
            "homeassistant"
        };
        (domain, self.service.as_str())
    }
}

/// Result of a reverse translation: the primary action and an optional
/// follow-up effect fired after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub primary: HubAction,
    pub effect: Option<HubAction>,
}

/// Summary of a hub entity for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubEntity {
    pub entity_id: String,
    pub friendly_name: String,
    pub state: String,
}

impl From<&RawEntityState> for HubEntity {
    fn from(raw: &RawEntityState) -> Self {
        Self {
            entity_id: raw.entity_id.clone(),
            friendly_name: raw.friendly_name().unwrap_or(&raw.entity_id).to_string(),
            state: raw.state.clone(),
        }
    }
}
