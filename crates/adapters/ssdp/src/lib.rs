//! # huemu-adapter-ssdp
//!
//! SSDP discovery responder.
//!
//! ## Responsibilities
//! - Listen on the SSDP multicast group for `M-SEARCH` requests
//! - Answer searches for the basic device type, the root device or
//!   `ssdp:all` with a unicast reply pointing at `/description.xml`
//! - Ignore everything else; log receive errors and keep listening
//!
//! ## Dependency rule
//! Depends on `huemu-domain` for the bridge identity only. Does not touch
//! the device cache.

mod config;
mod error;
mod responder;

pub use config::SsdpConfig;
pub use error::SsdpError;
pub use responder::{Responder, SearchTarget, bind_multicast, serve};
