//! `POST /api`: registration handshake.
//!
//! Every caller is accepted and handed the same username.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use huemu_domain::bridge::USERNAME;

#[derive(Serialize)]
pub struct Username {
    pub username: &'static str,
}

#[derive(Serialize)]
pub struct Success<T> {
    pub success: T,
}

/// Possible responses from the registration endpoint.
pub enum RegisterResponse {
    Ok(Json<[Success<Username>; 1]>),
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api` and `POST /api/`
pub async fn register() -> RegisterResponse {
    tracing::debug!("registration handshake");
    RegisterResponse::Ok(Json([Success {
        success: Username { username: USERNAME },
    }]))
}
