//! # huemu-adapter-storage-json
//!
//! Bridge configuration persisted as a single JSON document.
//!
//! ## Responsibilities
//! - Implement [`huemu_app::ports::ConfigRepository`] over a file
//! - Write atomically through a sibling temp file
//! - Migrate the flat `entity_mappings` layout into the ordered device list
//!
//! ## Dependency rule
//! Depends on `huemu-app` (for the port trait) and `huemu-domain` (for the
//! configuration types). The `app` and `domain` crates must never reference
//! this adapter.

mod error;
mod legacy;
mod repo;

pub use error::StoreError;
pub use repo::{JsonConfigRepository, SCHEMA_VERSION};
