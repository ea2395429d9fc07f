//! Hub-specific error type wrapping reqwest errors.

use huemu_domain::error::{BridgeError, ValidationError};

/// Errors originating from the Home Assistant client.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// No URL or token has been configured yet.
    #[error("hub connection is not configured")]
    NotConfigured,

    /// The configured URL cannot be parsed.
    #[error("invalid hub url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request could not be sent or its answer could not be read.
    #[error("hub request failed")]
    Transport(#[from] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub answered {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<HubError> for BridgeError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::InvalidUrl { .. } => {
                Self::Validation(ValidationError::MalformedRequest(err.to_string()))
            }
            other => Self::Hub(Box::new(other)),
        }
    }
}
