//! # huemu-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HubPort`: read raw entity states from the hub and invoke actions
//!   - `ConfigRepository`: load and save the bridge configuration
//! - Provide the **device cache** (`BridgeService`): debounced refresh,
//!   copy-out reads, optimistic writes with fire-and-forget dispatch, and
//!   the periodic refresh loop
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `huemu-domain` only (plus `tokio` for locks and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
