//! Device type → strategy lookup.

use super::{ClimateStrategy, CoverStrategy, CustomStrategy, LightStrategy, Strategy};
use crate::device::DeviceType;

/// Strategy used when a type has no entry.
const FALLBACK: Strategy = Strategy::Light(LightStrategy);

const STRATEGIES: [(DeviceType, Strategy); 4] = [
    (DeviceType::Light, Strategy::Light(LightStrategy)),
    (DeviceType::Cover, Strategy::Cover(CoverStrategy)),
    (DeviceType::Climate, Strategy::Climate(ClimateStrategy)),
    (DeviceType::Custom, Strategy::Custom(CustomStrategy)),
];

/// Strategy for a device type.
#[must_use]
pub fn for_type(device_type: DeviceType) -> Strategy {
    STRATEGIES
        .iter()
        .find(|(t, _)| *t == device_type)
        .map_or(FALLBACK, |(_, strategy)| *strategy)
}
