//! Translation between hub entity states and bridge states.
//!
//! Each device type has a [`Translator`] strategy. The set of strategies is
//! closed ([`Strategy`]) and selected through [`factory::for_type`].

mod climate;
mod cover;
mod custom;
pub mod factory;
mod light;

pub use climate::ClimateStrategy;
pub use cover::CoverStrategy;
pub use custom::CustomStrategy;
pub use light::LightStrategy;

use crate::bridge::LightMetadata;
use crate::device::{BridgeState, MAX_BRI, VirtualDevice};
use crate::hub::{ActionPlan, HubAction, RawEntityState};

const PHILIPS: &str = "Philips";

/// A bidirectional state/action translation for one device type.
pub trait Translator {
    /// Derive the bridge-shaped state from a raw hub state.
    fn to_bridge_state(&self, raw: &RawEntityState, device: &VirtualDevice) -> BridgeState;

    /// The strategy's default action for a desired bridge state, before any
    /// per-device override is applied.
    fn default_action(&self, state: &BridgeState, device: &VirtualDevice) -> HubAction;

    /// Rendering metadata for lights of this type.
    fn metadata(&self) -> LightMetadata;

    /// Full reverse translation: the default action with the device's
    /// overrides applied.
    fn to_hub_action(&self, state: &BridgeState, device: &VirtualDevice) -> ActionPlan {
        apply_overrides(self.default_action(state, device), state.on, device)
    }
}

/// Closed set of translation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Light(LightStrategy),
    Cover(CoverStrategy),
    Climate(ClimateStrategy),
    Custom(CustomStrategy),
}

impl Translator for Strategy {
    fn to_bridge_state(&self, raw: &RawEntityState, device: &VirtualDevice) -> BridgeState {
        match self {
            Self::Light(s) => s.to_bridge_state(raw, device),
            Self::Cover(s) => s.to_bridge_state(raw, device),
            Self::Climate(s) => s.to_bridge_state(raw, device),
            Self::Custom(s) => s.to_bridge_state(raw, device),
        }
    }

    fn default_action(&self, state: &BridgeState, device: &VirtualDevice) -> HubAction {
        match self {
            Self::Light(s) => s.default_action(state, device),
            Self::Cover(s) => s.default_action(state, device),
            Self::Climate(s) => s.default_action(state, device),
            Self::Custom(s) => s.default_action(state, device),
        }
    }

    fn metadata(&self) -> LightMetadata {
        match self {
            Self::Light(s) => s.metadata(),
            Self::Cover(s) => s.metadata(),
            Self::Climate(s) => s.metadata(),
            Self::Custom(s) => s.metadata(),
        }
    }
}

/// Merge static payload (static fields win), override the action name,
/// attach the follow-up effect and insert the entity reference.
fn apply_overrides(mut primary: HubAction, on: bool, device: &VirtualDevice) -> ActionPlan {
    let config = device.action_config.as_ref();

    if let Some(payload) = config.and_then(|c| c.payload_for(on)) {
        primary
            .data
            .extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(service) = config.and_then(|c| c.service_for(on)) {
        primary.service = service.to_string();
    }
    let mut effect = config.and_then(|c| c.effect_for(on)).map(HubAction::new);

    let omit = config.is_some_and(|c| c.omit_entity_id);
    if !omit {
        primary = primary.with("entity_id", device.entity_id.as_str());
        effect = effect.map(|e| e.with("entity_id", device.entity_id.as_str()));
    }

    ActionPlan { primary, effect }
}

/// Round and clamp a value onto the bridge 0–254 scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_scalar(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_BRI)) as u8
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// JSON number, written as an integer when there is no fractional part.
#[allow(clippy::cast_possible_truncation)]
fn number(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Value::from(value)
    }
}

fn metadata(type_label: &'static str, model_id: &'static str) -> LightMetadata {
    LightMetadata {
        type_label,
        model_id,
        manufacturer: PHILIPS,
    }
}
