use super::{Translator, metadata, number, round_to_tenth, to_scalar};
use crate::bridge::LightMetadata;
use crate::device::{BridgeState, VirtualDevice};
use crate::formula;
use crate::hub::{HubAction, RawEntityState};

/// Attributes read as the scalar input, first match wins.
const INPUT_ATTRIBUTES: [&str; 4] = ["brightness", "current_position", "temperature", "value"];

const OFF_STATES: [&str; 3] = ["off", "closed", "unavailable"];

/// User-mapped devices driven by formulas and the hub entity's domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomStrategy;

impl CustomStrategy {
    fn input(raw: &RawEntityState) -> f64 {
        INPUT_ATTRIBUTES
            .iter()
            .find_map(|key| raw.number(key))
            .or_else(|| raw.state.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

impl Translator for CustomStrategy {
    fn to_bridge_state(&self, raw: &RawEntityState, device: &VirtualDevice) -> BridgeState {
        let input = Self::input(raw);
        let value = match device.action_config.as_ref().and_then(|c| c.to_hue_formula()) {
            Some(expr) => formula::evaluate(expr, input),
            None => input,
        };
        BridgeState {
            on: !OFF_STATES.contains(&raw.state.as_str()),
            bri: to_scalar(value),
            reachable: !raw.is_unavailable(),
        }
    }

    fn default_action(&self, state: &BridgeState, device: &VirtualDevice) -> HubAction {
        let to_ha = device.action_config.as_ref().and_then(|c| c.to_ha_formula());
        let input = f64::from(state.bri);
        let output = to_ha.map_or(input, |expr| formula::evaluate(expr, input));
        let switch = if state.on { "turn_on" } else { "turn_off" };

        match device.entity_domain() {
            "light" if state.on && output > 0.0 => {
                HubAction::new(switch).with("brightness", number(output.round()))
            }
            "light" => HubAction::new(switch),
            "cover" => {
                let position = if state.on { output.round() } else { 0.0 };
                HubAction::new("set_cover_position").with("position", number(position))
            }
            "climate" => HubAction::new("set_temperature")
                .with("temperature", number(round_to_tenth(output))),
            "input_number" | "number" => {
                HubAction::new("set_value").with("value", number(round_to_tenth(output)))
            }
            _ if to_ha.is_some() => HubAction::new(switch).with("value", number(output)),
            _ => HubAction::new(switch),
        }
    }

    fn metadata(&self) -> LightMetadata {
        metadata("Extended color light", "LCT001")
    }
}
