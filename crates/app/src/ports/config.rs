//! Configuration port: persistence of the bridge configuration.

use std::future::Future;

use huemu_domain::config::BridgeConfig;
use huemu_domain::error::BridgeError;

/// Load/save access to the single [`BridgeConfig`] document.
pub trait ConfigRepository: Send + Sync {
    /// Read the current configuration. A store with nothing saved yet yields
    /// an empty configuration, not an error.
    fn get(&self) -> impl Future<Output = Result<BridgeConfig, BridgeError>> + Send;

    /// Replace the stored configuration.
    fn save(&self, config: &BridgeConfig) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
