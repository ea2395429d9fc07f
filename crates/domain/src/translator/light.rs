use super::{Translator, metadata, number, to_scalar};
use crate::bridge::LightMetadata;
use crate::device::{BridgeState, VirtualDevice};
use crate::hub::{HubAction, RawEntityState};

/// Dimmable lights and plain switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightStrategy;

impl Translator for LightStrategy {
    fn to_bridge_state(&self, raw: &RawEntityState, _device: &VirtualDevice) -> BridgeState {
        BridgeState {
            on: raw.state == "on",
            bri: raw.number("brightness").map_or(0, to_scalar),
            reachable: !raw.is_unavailable(),
        }
    }

    fn default_action(&self, state: &BridgeState, _device: &VirtualDevice) -> HubAction {
        if !state.on {
            return HubAction::new("turn_off");
        }
        let action = HubAction::new("turn_on");
        if state.bri > 0 {
            action.with("brightness", number(f64::from(state.bri)))
        } else {
            action
        }
    }

    fn metadata(&self) -> LightMetadata {
        metadata("Extended color light", "LCT001")
    }
}
