//! `GET /description.xml`: UPnP device description.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_domain::bridge::{BridgeIdentity, IDENTITY};

use crate::state::{Advertise, AppState};

/// Possible responses from the description endpoint.
pub enum DescriptionResponse {
    Ok(String),
}

impl IntoResponse for DescriptionResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(xml) => ([(header::CONTENT_TYPE, "text/xml")], xml).into_response(),
        }
    }
}

/// `GET /description.xml`
pub async fn get<H, C>(State(state): State<AppState<H, C>>) -> DescriptionResponse
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    DescriptionResponse::Ok(render(&IDENTITY, &state.advertise))
}

/// Render the description document for an identity at an address.
#[must_use]
pub fn render(identity: &BridgeIdentity, advertise: &Advertise) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
<specVersion>
<major>1</major>
<minor>0</minor>
</specVersion>
<URLBase>{base}</URLBase>
<device>
<deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
<friendlyName>{name} ({ip})</friendlyName>
<manufacturer>{manufacturer}</manufacturer>
<manufacturerURL>http://www.philips.com</manufacturerURL>
<modelDescription>Philips hue Personal Wireless Lighting</modelDescription>
<modelName>{model_name}</modelName>
<modelNumber>929000226503</modelNumber>
<modelURL>http://www.meethue.com</modelURL>
<serialNumber>{serial}</serialNumber>
<UDN>{udn}</UDN>
<presentationURL>admin</presentationURL>
</device>
</root>
"#,
        base = advertise.base_url(),
        name = identity.name,
        ip = advertise.ip,
        manufacturer = identity.manufacturer,
        model_name = identity.model_name,
        serial = identity.serial,
        udn = identity.udn(),
    )
}
