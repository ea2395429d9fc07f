//! # huemu-adapter-home-assistant
//!
//! Home Assistant REST client.
//!
//! ## Responsibilities
//! - Implement [`huemu_app::ports::HubPort`] over the hub's REST API
//! - Authenticate with a long-lived bearer token
//! - Map transport failures and non-2xx answers into hub errors
//!
//! ## Dependency rule
//! Depends on `huemu-app` (for the port trait) and `huemu-domain` (for the
//! hub shapes). Nothing else references this adapter except the binary.

mod client;
mod error;

pub use client::{DEFAULT_TIMEOUT, HomeAssistantClient};
pub use error::HubError;
