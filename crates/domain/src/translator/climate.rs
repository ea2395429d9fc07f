use super::{Translator, metadata, number, round_to_tenth, to_scalar};
use crate::bridge::LightMetadata;
use crate::device::{BridgeState, MAX_BRI, VirtualDevice};
use crate::hub::{HubAction, RawEntityState};

const MIN_TEMP: f64 = 7.0;
const MAX_TEMP: f64 = 28.0;
const SPAN: f64 = MAX_TEMP - MIN_TEMP;

/// Thermostats: target temperature 7–28 °C maps onto 0–254.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClimateStrategy;

impl Translator for ClimateStrategy {
    fn to_bridge_state(&self, raw: &RawEntityState, _device: &VirtualDevice) -> BridgeState {
        let bri = raw.number("temperature").map_or(0, |t| {
            to_scalar((t.clamp(MIN_TEMP, MAX_TEMP) - MIN_TEMP) * f64::from(MAX_BRI) / SPAN)
        });
        let reachable = !raw.is_unavailable();
        BridgeState {
            on: reachable,
            bri,
            reachable,
        }
    }

    fn default_action(&self, state: &BridgeState, _device: &VirtualDevice) -> HubAction {
        let temperature = f64::from(state.bri) * SPAN / f64::from(MAX_BRI) + MIN_TEMP;
        HubAction::new("set_temperature").with("temperature", number(round_to_tenth(temperature)))
    }

    fn metadata(&self) -> LightMetadata {
        metadata("Dimmable light", "LWB004")
    }
}
