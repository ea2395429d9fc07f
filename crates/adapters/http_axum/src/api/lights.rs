//! Light resources: list, get and partial state writes.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::{Map, Value};

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_domain::bridge::IDENTITY;
use huemu_domain::device::{Device, MAX_BRI, StateUpdate};
use huemu_domain::error::{BridgeError, NotFoundError};
use huemu_domain::id::HueId;
use huemu_domain::translator::{Translator, factory};

use crate::error::ApiError;
use crate::state::AppState;

/// Bridge-protocol rendering of a device's state.
#[derive(Debug, Serialize)]
pub struct LightStateView {
    pub on: bool,
    pub bri: u8,
    pub alert: &'static str,
    pub reachable: bool,
}

/// Bridge-protocol rendering of a device.
#[derive(Debug, Serialize)]
pub struct LightView {
    pub state: LightStateView,
    #[serde(rename = "type")]
    pub type_label: &'static str,
    pub name: String,
    pub modelid: &'static str,
    pub manufacturername: &'static str,
    pub uniqueid: String,
    pub swversion: &'static str,
}

impl From<&Device> for LightView {
    fn from(device: &Device) -> Self {
        let metadata = factory::for_type(device.device_type).metadata();
        Self {
            state: LightStateView {
                on: device.state.on,
                bri: device.state.bri,
                alert: "none",
                reachable: device.state.reachable,
            },
            type_label: metadata.type_label,
            name: device.name.clone(),
            modelid: metadata.model_id,
            manufacturername: metadata.manufacturer,
            uniqueid: unique_id(device.id),
            swversion: IDENTITY.swversion,
        }
    }
}

/// MAC-style unique id derived from the bridge id.
fn unique_id(id: HueId) -> String {
    let [a, b, c, d] = id.value().to_be_bytes();
    format!("00:17:88:01:{a:02x}:{b:02x}:{c:02x}:{d:02x}-0b")
}

/// Lights keyed by bridge id, serialized in ascending id order.
#[derive(Debug)]
pub struct LightMap(pub Vec<(HueId, LightView)>);

impl From<&[Device]> for LightMap {
    fn from(devices: &[Device]) -> Self {
        Self(devices.iter().map(|d| (d.id, LightView::from(d))).collect())
    }
}

impl Serialize for LightMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, light) in &self.0 {
            map.serialize_entry(&id.to_string(), light)?;
        }
        map.end()
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<LightMap>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<LightView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the state endpoint.
pub enum SetStateResponse {
    Ok(Json<Vec<Value>>),
}

impl IntoResponse for SetStateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_light_id(raw: &str) -> Result<HueId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::from(BridgeError::from(NotFoundError {
            entity: "Light",
            id: raw.to_string(),
        }))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_bri(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(MAX_BRI)) as u8
}

/// Extract the recognized keys of a state write, in protocol order.
fn parse_update(body: &[u8]) -> Result<(StateUpdate, Vec<(&'static str, Value)>), ApiError> {
    let fields: Map<String, Value> = serde_json::from_slice(body).map_err(ApiError::malformed)?;
    let mut update = StateUpdate::default();
    let mut applied = Vec::new();

    if let Some(value) = fields.get("on") {
        let on = value
            .as_bool()
            .ok_or_else(|| ApiError::malformed("\"on\" must be a boolean"))?;
        update.on = Some(on);
        applied.push(("on", Value::Bool(on)));
    }
    if let Some(value) = fields.get("bri") {
        let bri = value
            .as_f64()
            .map(clamp_bri)
            .ok_or_else(|| ApiError::malformed("\"bri\" must be a number"))?;
        update.bri = Some(bri);
        applied.push(("bri", Value::from(bri)));
    }
    Ok((update, applied))
}

/// `GET /api/{user}/lights`
pub async fn list<H, C>(State(state): State<AppState<H, C>>) -> Result<ListResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let devices = state.bridge.list_devices().await?;
    Ok(ListResponse::Ok(Json(LightMap::from(devices.as_slice()))))
}

/// `GET /api/{user}/lights/{id}`
pub async fn get<H, C>(
    State(state): State<AppState<H, C>>,
    Path((_user, id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let id = parse_light_id(&id)?;
    let device = state.bridge.get_device(id).await?;
    Ok(GetResponse::Ok(Json(LightView::from(&device))))
}

/// `PUT /api/{user}/lights/{id}/state`
///
/// Answers with one success object per recognized key; other keys are
/// ignored.
pub async fn set_state<H, C>(
    State(state): State<AppState<H, C>>,
    Path((_user, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<SetStateResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let id = parse_light_id(&id)?;
    let (update, applied) = parse_update(&body)?;
    if update.is_empty() {
        state.bridge.get_device(id).await?;
    } else {
        state.bridge.set_state(id, update).await?;
    }

    let results = applied
        .into_iter()
        .map(|(key, value)| {
            let mut path = Map::new();
            path.insert(format!("/lights/{id}/state/{key}"), value);
            let mut entry = Map::new();
            entry.insert("success".to_string(), Value::Object(path));
            Value::Object(entry)
        })
        .collect();
    Ok(SetStateResponse::Ok(Json(results)))
}
