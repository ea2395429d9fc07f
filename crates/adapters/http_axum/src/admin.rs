//! Admin JSON API over the configuration and the device cache.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_app::services::bridge_service::CacheStatus;
use huemu_domain::config::BridgeConfig;
use huemu_domain::hub::HubEntity;
use huemu_domain::time;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/admin` routes.
pub fn routes<H, C>() -> Router<AppState<H, C>>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    Router::new()
        .route(
            "/admin/config",
            get(get_config::<H, C>).post(update_config::<H, C>),
        )
        .route("/admin/hub-entities", get(hub_entities::<H, C>))
        .route("/admin/status", get(status::<H, C>))
}

/// Cache bookkeeping as served to the admin.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub generation: u64,
    pub device_count: usize,
    pub refreshed_at: Option<String>,
    pub hub_configured: bool,
}

impl From<CacheStatus> for StatusView {
    fn from(status: CacheStatus) -> Self {
        Self {
            generation: status.generation,
            device_count: status.device_count,
            refreshed_at: status.refreshed_at.map(time::rfc3339),
            hub_configured: status.hub_configured,
        }
    }
}

/// Possible responses from the config endpoints.
pub enum ConfigResponse {
    Ok(Json<BridgeConfig>),
}

impl IntoResponse for ConfigResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the hub entities endpoint.
pub enum EntitiesResponse {
    Ok(Json<Vec<HubEntity>>),
}

impl IntoResponse for EntitiesResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the status endpoint.
pub enum StatusResponse {
    Ok(Json<StatusView>),
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /admin/config`
///
/// # Errors
///
/// Returns a storage error when the configuration cannot be read.
pub async fn get_config<H, C>(
    State(state): State<AppState<H, C>>,
) -> Result<ConfigResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let config = state.bridge.config().await?;
    Ok(ConfigResponse::Ok(Json(config)))
}

/// `POST /admin/config`
///
/// Replaces the configuration and answers with it as stored, identifiers
/// included.
///
/// # Errors
///
/// Returns 400 for an unreadable body or invalid configuration.
pub async fn update_config<H, C>(
    State(state): State<AppState<H, C>>,
    body: Bytes,
) -> Result<ConfigResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let config: BridgeConfig = serde_json::from_slice(&body).map_err(ApiError::malformed)?;
    let stored = state.bridge.update_config(config).await?;
    Ok(ConfigResponse::Ok(Json(stored)))
}

/// `GET /admin/hub-entities`
///
/// # Errors
///
/// Returns 500 when the hub cannot be queried.
pub async fn hub_entities<H, C>(
    State(state): State<AppState<H, C>>,
) -> Result<EntitiesResponse, ApiError>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    let entities = state.bridge.hub_entities().await?;
    Ok(EntitiesResponse::Ok(Json(entities)))
}

/// `GET /admin/status`
pub async fn status<H, C>(State(state): State<AppState<H, C>>) -> StatusResponse
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    StatusResponse::Ok(Json(StatusView::from(state.bridge.status())))
}
