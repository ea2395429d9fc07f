use super::{Translator, metadata, number, to_scalar};
use crate::bridge::LightMetadata;
use crate::device::{BridgeState, VirtualDevice};
use crate::hub::{HubAction, RawEntityState};

const SCALE: f64 = 2.54;

/// Blinds, shutters and garage doors: position 0–100 maps onto 0–254.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverStrategy;

impl Translator for CoverStrategy {
    fn to_bridge_state(&self, raw: &RawEntityState, _device: &VirtualDevice) -> BridgeState {
        BridgeState {
            on: raw.state == "open",
            bri: raw
                .number("current_position")
                .map_or(0, |position| to_scalar(position * SCALE)),
            reachable: !raw.is_unavailable(),
        }
    }

    fn default_action(&self, state: &BridgeState, _device: &VirtualDevice) -> HubAction {
        let position = match (state.on, state.bri) {
            (false, _) => 0.0,
            (true, 0) => 100.0,
            (true, bri) => (f64::from(bri) / SCALE).round(),
        };
        HubAction::new("set_cover_position").with("position", number(position))
    }

    fn metadata(&self) -> LightMetadata {
        metadata("Window covering device", "LCT001")
    }
}
