//! Static identity of the emulated bridge.

use uuid::Uuid;

/// Bridge model and firmware the discovery client expects to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeIdentity {
    pub name: &'static str,
    pub swversion: &'static str,
    pub apiversion: &'static str,
    pub mac: &'static str,
    pub bridge_id: &'static str,
    pub model_id: &'static str,
    pub serial: &'static str,
    pub uuid: Uuid,
    pub manufacturer: &'static str,
    pub model_name: &'static str,
    /// `SERVER` banner used in discovery replies.
    pub server: &'static str,
}

/// The only identity this bridge ever advertises.
pub const IDENTITY: BridgeIdentity = BridgeIdentity {
    name: "Philips hue",
    swversion: "01003542",
    apiversion: "1.11.0",
    mac: "00:17:88:10:22:01",
    bridge_id: "001788FFFE102201",
    model_id: "BSB001",
    serial: "001788102201",
    uuid: Uuid::from_u128(0x2f40_2f80_da50_11e1_9b23_0017_8810_2201),
    manufacturer: "Royal Philips Electronics",
    model_name: "Philips hue bridge 2012",
    server: "FreeRTOS/6.0.5, UPnP/1.1, IpBridge/1.17.0",
};

/// Username handed out by the registration handshake.
pub const USERNAME: &str = "admin";

/// Rendering metadata for a light, supplied by its translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightMetadata {
    pub type_label: &'static str,
    pub model_id: &'static str,
    pub manufacturer: &'static str,
}

impl BridgeIdentity {
    /// `uuid:…` form used in `USN` headers and the description document.
    #[must_use]
    pub fn udn(&self) -> String {
        format!("uuid:{}", self.uuid.hyphenated())
    }
}
