//! Hub port: access to the upstream home-automation hub.

use std::future::Future;

use huemu_domain::config::HubSettings;
use huemu_domain::error::BridgeError;
use huemu_domain::hub::{HubAction, HubEntity, RawEntityState};

/// Capability to read raw entity states and invoke actions on the hub.
pub trait HubPort: Send + Sync {
    /// Whether connection settings are present and usable.
    fn is_configured(&self) -> bool;

    /// Point the client at new connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when the settings cannot be used.
    fn configure(&self, settings: &HubSettings) -> Result<(), BridgeError>;

    /// Fetch the raw state of every hub entity.
    fn fetch_states(&self) -> impl Future<Output = Result<Vec<RawEntityState>, BridgeError>> + Send;

    /// Invoke `action` on behalf of `entity_id`.
    fn call_action(
        &self,
        entity_id: &str,
        action: &HubAction,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Summaries of every hub entity, sorted by entity id.
    fn list_entities(&self) -> impl Future<Output = Result<Vec<HubEntity>, BridgeError>> + Send {
        async {
            let mut entities: Vec<HubEntity> =
                self.fetch_states().await?.iter().map(HubEntity::from).collect();
            entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
            Ok(entities)
        }
    }
}
