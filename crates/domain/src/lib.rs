//! # huemu-domain
//!
//! Pure domain model for the huemu bridge emulator.
//!
//! ## Responsibilities
//! - Foundational types: bridge identifiers, error conventions, timestamps
//! - Define **virtual devices** (hub entity ↔ bridge identity bindings) and
//!   the bridge-side state model
//! - Define the hub-side shapes (raw entity states, outbound actions)
//! - Evaluate user **formulas** for custom mappings
//! - Translate between hub and bridge states through per-type **strategies**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod bridge;
pub mod config;
pub mod device;
pub mod formula;
pub mod hub;
pub mod translator;
