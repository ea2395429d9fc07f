//! Storage-specific error type wrapping IO and JSON errors.

use std::path::PathBuf;

use huemu_domain::error::BridgeError;

/// Errors originating from the JSON configuration store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing or renaming the document failed.
    #[error("unable to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the schema.
    #[error("invalid configuration document")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        Self::Storage(Box::new(err))
    }
}
