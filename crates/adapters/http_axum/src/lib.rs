//! # huemu-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **emulated bridge protocol**: `/description.xml`, the
//!   registration handshake, the full-state snapshot and the `lights`
//!   resources under `/api/{user}`
//! - Serve a small **admin JSON API** (`/admin/config`, `/admin/hub-entities`,
//!   `/admin/status`) over the configuration and the device cache
//! - Map HTTP requests into `BridgeService` calls (driving adapter)
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `huemu-app` (for port traits and services) and `huemu-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod admin;
pub mod api;
pub mod description;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
