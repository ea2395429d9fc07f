//! Bridge config and full-state snapshot.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_domain::bridge::{BridgeIdentity, IDENTITY};
use huemu_domain::time::{self, Timestamp};

use super::lights::LightMap;
use crate::error::ApiError;
use crate::state::{Advertise, AppState};

/// Static bridge metadata as reported by the protocol.
#[derive(Debug, Serialize)]
pub struct BridgeConfigView {
    pub name: &'static str,
    pub swversion: &'static str,
    pub apiversion: &'static str,
    pub mac: &'static str,
    pub bridgeid: &'static str,
    pub modelid: &'static str,
    pub ipaddress: String,
    #[serde(rename = "UTC")]
    pub utc: String,
}

impl BridgeConfigView {
    #[must_use]
    pub fn new(identity: &BridgeIdentity, advertise: &Advertise, now: Timestamp) -> Self {
        Self {
            name: identity.name,
            swversion: identity.swversion,
            apiversion: identity.apiversion,
            mac: identity.mac,
            bridgeid: identity.bridge_id,
            modelid: identity.model_id,
            ipaddress: advertise.ip.clone(),
            utc: time::bridge_clock(now),
        }
    }
}

/// Full-state snapshot: lights, (empty) groups and config.
#[derive(Debug, Serialize)]
pub struct FullState {
    pub lights: LightMap,
    pub groups: BTreeMap<String, serde_json::Value>,
    pub config: BridgeConfigView,
}

/// Possible responses from the config endpoint.
pub enum ConfigResponse {
    Ok(Json<BridgeConfigView>),
}

impl IntoResponse for ConfigResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the full-state endpoint.
pub enum FullStateResponse {
    Ok(Json<FullState>),
}

impl IntoResponse for FullStateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/config` and `GET /api/{user}/config`
pub async fn get<H, C>(State(state): State<AppState<H, C>>) -> ConfigResponse
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    ConfigResponse::Ok(Json(BridgeConfigView::new(
        &IDENTITY,
        &state.advertise,
        time::now(),
    )))
}

/// `GET /api/{user}`
pub async fn full_state<H, C>(
    State(state): State<AppState<H, C>>,
) -> Result<FullStateResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let devices = state.bridge.list_devices().await?;
    Ok(FullStateResponse::Ok(Json(FullState {
        lights: LightMap::from(devices.as_slice()),
        groups: BTreeMap::new(),
        config: BridgeConfigView::new(&IDENTITY, &state.advertise, time::now()),
    })))
}
