//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use huemu_app::ports::{ConfigRepository, HubPort};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves the bridge protocol under `/api`, the description document, the
/// admin API under `/admin` and a health check. Includes a [`TraceLayer`]
/// that logs each HTTP request/response at the `DEBUG` level using the
/// `tracing` ecosystem.
pub fn build<H, C>(state: AppState<H, C>) -> Router
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/description.xml", get(crate::description::get::<H, C>))
        .merge(crate::api::routes())
        .merge(crate::admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
