//! Shared application state for axum handlers.

use std::sync::Arc;

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_app::services::bridge_service::BridgeService;

/// Address the bridge advertises to discovery clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertise {
    pub ip: String,
    pub port: u16,
}

impl Advertise {
    /// `http://ip:port/`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.ip, self.port)
    }
}

/// Application state shared across all axum handlers.
///
/// Generic over the hub and configuration ports to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<H, C> {
    /// Device cache and configuration use-cases.
    pub bridge: Arc<BridgeService<H, C>>,
    /// Advertised host address.
    pub advertise: Arc<Advertise>,
}

impl<H, C> Clone for AppState<H, C> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            advertise: Arc::clone(&self.advertise),
        }
    }
}

impl<H, C> AppState<H, C>
where
    H: HubPort + 'static,
    C: ConfigRepository + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(bridge: BridgeService<H, C>, advertise: Advertise) -> Self {
        Self::from_arc(Arc::new(bridge), advertise)
    }

    /// Create a new application state from a pre-wrapped `Arc` service.
    ///
    /// Use this when the service is shared with background tasks such as
    /// the refresh loop.
    pub fn from_arc(bridge: Arc<BridgeService<H, C>>, advertise: Advertise) -> Self {
        Self {
            bridge,
            advertise: Arc::new(advertise),
        }
    }
}
