//! Emulated bridge protocol under `/api`.
//!
//! Only the resources a discovery client needs are served: registration,
//! the full-state snapshot, bridge config and lights.

#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod lights;
pub mod registration;

use axum::Router;
use axum::routing::{get, post, put};

use huemu_app::ports::{ConfigRepository, HubPort};

use crate::state::AppState;

/// Build the bridge protocol routes.
pub fn routes<H, C>() -> Router<AppState<H, C>>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    Router::new()
        .route("/api", post(registration::register))
        .route("/api/", post(registration::register))
        .route("/api/config", get(config::get::<H, C>))
        .route("/api/{user}", get(config::full_state::<H, C>))
        .route("/api/{user}/config", get(config::get::<H, C>))
        .route("/api/{user}/lights", get(lights::list::<H, C>))
        .route("/api/{user}/lights/{id}", get(lights::get::<H, C>))
        .route(
            "/api/{user}/lights/{id}/state",
            put(lights::set_state::<H, C>),
        )
}
