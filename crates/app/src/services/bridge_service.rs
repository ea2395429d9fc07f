//! Bridge service: the device cache behind the bridge protocol.
//!
//! The cache holds one *generation* of translated devices. A refresh pulls
//! every raw state from the hub, translates each configured virtual device
//! and swaps the whole map in at once. Reads hand out clones; writes update
//! the cached state optimistically and push the translated action to the
//! hub on a detached task.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use huemu_domain::config::BridgeConfig;
use huemu_domain::device::{Device, StateUpdate};
use huemu_domain::error::{BridgeError, NotFoundError};
use huemu_domain::hub::{ActionPlan, HubEntity, RawEntityState};
use huemu_domain::id::HueId;
use huemu_domain::time::{self, Timestamp};
use huemu_domain::translator::{Translator, factory};

use crate::ports::{ConfigRepository, HubPort};

/// Minimum delay between two refreshes that actually reach the hub.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Period of the background refresh loop.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct DeviceCache {
    generation: u64,
    devices: HashMap<HueId, Device>,
    refreshed_at: Option<Timestamp>,
}

/// Snapshot of the cache bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    /// Number of successful refreshes so far; `0` means never populated.
    pub generation: u64,
    pub device_count: usize,
    pub refreshed_at: Option<Timestamp>,
    pub hub_configured: bool,
}

/// Application service owning the device cache.
pub struct BridgeService<H, C> {
    hub: Arc<H>,
    repo: C,
    cache: RwLock<DeviceCache>,
    /// Completion time of the last successful refresh. Holding the lock is
    /// what makes a refresh exclusive.
    last_refresh: Mutex<Option<Instant>>,
    cooldown: Duration,
}

impl<H, C> BridgeService<H, C>
where
    H: HubPort + 'static,
    C: ConfigRepository,
{
    /// Create a service with the default refresh cooldown.
    pub fn new(hub: H, repo: C) -> Self {
        Self::with_cooldown(hub, repo, DEFAULT_COOLDOWN)
    }

    /// Create a service with a custom refresh cooldown.
    pub fn with_cooldown(hub: H, repo: C, cooldown: Duration) -> Self {
        Self {
            hub: Arc::new(hub),
            repo,
            cache: RwLock::new(DeviceCache::default()),
            last_refresh: Mutex::new(None),
            cooldown,
        }
    }

    /// Access the hub capability.
    pub fn hub(&self) -> &H {
        &self.hub
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, DeviceCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, DeviceCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the cache from the hub unless a refresh completed within the
    /// cooldown window.
    ///
    /// An unconfigured hub empties the cache without querying anything.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the configuration cannot be read, or
    /// [`BridgeError::Hub`] when the hub cannot be queried. The previous
    /// generation stays in place in both cases.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), BridgeError> {
        let mut last = self.last_refresh.lock().await;
        if last.is_some_and(|at| at.elapsed() < self.cooldown) {
            tracing::trace!("refresh skipped, within cooldown");
            return Ok(());
        }
        if !self.hub.is_configured() {
            let cleared = {
                let mut cache = self.write_cache();
                let cleared = !cache.devices.is_empty();
                cache.devices.clear();
                cleared
            };
            if cleared {
                tracing::info!("hub no longer configured, device cache cleared");
            }
            tracing::debug!("hub not configured, refresh skipped");
            return Ok(());
        }

        let config = self.repo.get().await?;
        let states = self.hub.fetch_states().await?;
        let devices = build_generation(&config, &states);
        let device_count = devices.len();

        let generation = {
            let mut cache = self.write_cache();
            cache.generation += 1;
            cache.devices = devices;
            cache.refreshed_at = Some(time::now());
            cache.generation
        };
        *last = Some(Instant::now());

        tracing::debug!(generation, device_count, "device cache refreshed");
        Ok(())
    }

    /// Refresh, bypassing the cooldown.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn force_refresh(&self) -> Result<(), BridgeError> {
        *self.last_refresh.lock().await = None;
        self.refresh().await
    }

    async fn ensure_populated(&self) -> Result<(), BridgeError> {
        let populated = self.read_cache().generation > 0;
        if !populated {
            self.refresh().await?;
        }
        Ok(())
    }

    /// All cached devices, ordered by bridge id.
    ///
    /// # Errors
    ///
    /// Propagates the error of the initial refresh when the cache has never
    /// been populated.
    pub async fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
        self.ensure_populated().await?;
        let mut devices: Vec<Device> = self.read_cache().devices.values().cloned().collect();
        devices.sort_by_key(|device| device.id);
        Ok(devices)
    }

    /// One cached device.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown id, or the error of
    /// the initial refresh.
    pub async fn get_device(&self, id: HueId) -> Result<Device, BridgeError> {
        self.ensure_populated().await?;
        self.read_cache()
            .devices
            .get(&id)
            .cloned()
            .ok_or_else(|| light_not_found(id))
    }

    /// Apply a partial state write.
    ///
    /// The merged state is visible to readers as soon as this returns; the
    /// hub is contacted afterwards on a detached task and failures there are
    /// only logged. A suppressed transition changes nothing and contacts
    /// nobody.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub async fn set_state(&self, id: HueId, update: StateUpdate) -> Result<(), BridgeError> {
        self.ensure_populated().await?;

        let (entity_id, plan) = {
            let mut cache = self.write_cache();
            let device = cache.devices.get_mut(&id).ok_or_else(|| light_not_found(id))?;
            let desired = device.state.merged(&update);
            let plan = factory::for_type(device.device_type)
                .to_hub_action(&desired, &device.virtual_device);
            if device.virtual_device.suppresses(desired.on) {
                tracing::debug!(entity_id = %device.entity_id, on = desired.on, "transition suppressed");
                return Ok(());
            }
            device.state = desired;
            (device.entity_id.clone(), plan)
        };

        self.dispatch(entity_id, plan);
        Ok(())
    }

    fn dispatch(&self, entity_id: String, plan: ActionPlan) {
        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            for action in std::iter::once(plan.primary).chain(plan.effect) {
                if let Err(err) = hub.call_action(&entity_id, &action).await {
                    tracing::warn!(%entity_id, service = %action.service, error = ?err, "hub action failed");
                    break;
                }
                tracing::debug!(%entity_id, service = %action.service, "hub action sent");
            }
        });
    }

    /// The stored configuration.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn config(&self) -> Result<BridgeConfig, BridgeError> {
        self.repo.get().await
    }

    /// Replace the configuration and rebuild the cache from it.
    ///
    /// Devices keep the id they were submitted with, or inherit the id of
    /// the stored device with the same entity and name; the rest get fresh
    /// ids above every id in use. Returns the configuration as stored.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] for duplicate ids, unbound
    /// devices or hub settings the hub rejects, a storage error, or the
    /// error of the follow-up refresh. Nothing is stored when validation
    /// fails, and the running hub settings are restored when saving fails.
    #[tracing::instrument(skip(self, config), fields(devices = config.virtual_devices.len()))]
    pub async fn update_config(&self, mut config: BridgeConfig) -> Result<BridgeConfig, BridgeError> {
        let previous = self.repo.get().await?;
        config.inherit_hue_ids(&previous);
        let assigned = config.assign_missing_hue_ids(previous.max_hue_id());
        config.validate()?;

        // hub settings are checked before anything is persisted
        self.hub.configure(&config.hub_settings())?;
        if let Err(err) = self.repo.save(&config).await {
            if let Err(restore) = self.hub.configure(&previous.hub_settings()) {
                tracing::warn!(error = ?restore, "unable to restore previous hub settings");
            }
            return Err(err);
        }
        tracing::info!(assigned, "configuration updated");

        self.force_refresh().await?;
        Ok(config)
    }

    /// Every entity the hub knows about.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Hub`] when the hub cannot be queried.
    pub async fn hub_entities(&self) -> Result<Vec<HubEntity>, BridgeError> {
        self.hub.list_entities().await
    }

    /// Cache bookkeeping snapshot.
    pub fn status(&self) -> CacheStatus {
        let cache = self.read_cache();
        CacheStatus {
            generation: cache.generation,
            device_count: cache.devices.len(),
            refreshed_at: cache.refreshed_at,
            hub_configured: self.hub.is_configured(),
        }
    }

    /// Refresh on a fixed period until `cancel` fires.
    pub async fn run_refresh_loop(&self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.refresh().await {
                        tracing::warn!(error = ?err, "periodic refresh failed");
                    }
                }
            }
        }
        tracing::debug!("refresh loop stopped");
    }
}

fn light_not_found(id: HueId) -> BridgeError {
    NotFoundError {
        entity: "Light",
        id: id.to_string(),
    }
    .into()
}

/// Translate every configured device against the fetched states.
fn build_generation(config: &BridgeConfig, states: &[RawEntityState]) -> HashMap<HueId, Device> {
    let index: HashMap<&str, &RawEntityState> =
        states.iter().map(|s| (s.entity_id.as_str(), s)).collect();

    let mut devices = HashMap::with_capacity(config.virtual_devices.len());
    for vd in &config.virtual_devices {
        let Some(id) = vd.hue_id else {
            tracing::warn!(entity_id = %vd.entity_id, "virtual device without bridge id skipped");
            continue;
        };
        let strategy = factory::for_type(vd.device_type);
        let state = match index.get(vd.entity_id.as_str()) {
            Some(raw) => strategy.to_bridge_state(raw, vd),
            None => strategy.to_bridge_state(&RawEntityState::unavailable(&vd.entity_id), vd),
        };
        devices.insert(
            id,
            Device {
                id,
                name: vd.name.clone(),
                device_type: vd.device_type,
                entity_id: vd.entity_id.clone(),
                state,
                virtual_device: vd.clone(),
            },
        );
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use huemu_domain::config::HubSettings;
    use huemu_domain::device::{ActionConfig, DeviceType, VirtualDevice};
    use huemu_domain::error::ValidationError;
    use huemu_domain::hub::HubAction;
    use std::future::Future;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubHub {
        states: StdMutex<Vec<RawEntityState>>,
        fetches: AtomicUsize,
        calls: StdMutex<Vec<(String, HubAction)>>,
        settings: StdMutex<Option<HubSettings>>,
        unconfigured: AtomicBool,
        fail_fetch: AtomicBool,
        fail_calls: AtomicBool,
    }

    impl StubHub {
        fn with_states(states: Vec<RawEntityState>) -> Self {
            Self {
                states: StdMutex::new(states),
                ..Self::default()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn calls(&self) -> Vec<(String, HubAction)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl HubPort for StubHub {
        fn is_configured(&self) -> bool {
            !self.unconfigured.load(Ordering::SeqCst)
        }

        fn configure(&self, settings: &HubSettings) -> Result<(), BridgeError> {
            if !settings.url.is_empty() && !settings.url.contains("://") {
                return Err(BridgeError::Validation(ValidationError::MalformedRequest(
                    format!("invalid hub url {:?}", settings.url),
                )));
            }
            *self.settings.lock().unwrap() = Some(settings.clone());
            Ok(())
        }

        fn fetch_states(&self) -> impl Future<Output = Result<Vec<RawEntityState>, BridgeError>> + Send {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail_fetch.load(Ordering::SeqCst) {
                Err(BridgeError::Hub("connection refused".into()))
            } else {
                Ok(self.states.lock().unwrap().clone())
            };
            async { result }
        }

        fn call_action(
            &self,
            entity_id: &str,
            action: &HubAction,
        ) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push((entity_id.to_string(), action.clone()));
            let result = if self.fail_calls.load(Ordering::SeqCst) {
                Err(BridgeError::Hub("service call rejected".into()))
            } else {
                Ok(())
            };
            async { result }
        }
    }

    #[derive(Default)]
    struct InMemoryConfigRepo {
        config: StdMutex<BridgeConfig>,
        fail_save: AtomicBool,
    }

    impl InMemoryConfigRepo {
        fn with_devices(devices: Vec<VirtualDevice>) -> Self {
            Self {
                config: StdMutex::new(BridgeConfig {
                    hub_url: "http://hub.local:8123".into(),
                    hub_token: "token".into(),
                    local_ip: None,
                    virtual_devices: devices,
                }),
                fail_save: AtomicBool::new(false),
            }
        }
    }

    impl ConfigRepository for InMemoryConfigRepo {
        fn get(&self) -> impl Future<Output = Result<BridgeConfig, BridgeError>> + Send {
            let config = self.config.lock().unwrap().clone();
            async { Ok(config) }
        }

        fn save(&self, config: &BridgeConfig) -> impl Future<Output = Result<(), BridgeError>> + Send {
            let result = if self.fail_save.load(Ordering::SeqCst) {
                Err(BridgeError::Storage("disk full".into()))
            } else {
                *self.config.lock().unwrap() = config.clone();
                Ok(())
            };
            async { result }
        }
    }

    fn raw(entity_id: &str, state: &str, attributes: serde_json::Value) -> RawEntityState {
        RawEntityState {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    fn light(id: u32, entity_id: &str) -> VirtualDevice {
        VirtualDevice::builder()
            .hue_id(HueId::new(id))
            .name(format!("Light {id}"))
            .entity_id(entity_id)
            .build()
            .unwrap()
    }

    fn kitchen_service() -> BridgeService<StubHub, InMemoryConfigRepo> {
        BridgeService::new(
            StubHub::with_states(vec![raw("light.kitchen", "on", serde_json::json!({"brightness": 127}))]),
            InMemoryConfigRepo::with_devices(vec![light(1, "light.kitchen")]),
        )
    }

    async fn wait_for_calls(hub: &StubHub, expected: usize) {
        for _ in 0..100 {
            if hub.calls().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn should_fetch_once_when_refreshing_back_to_back() {
        let service = kitchen_service();
        service.refresh().await.unwrap();
        service.refresh().await.unwrap();
        assert_eq!(service.hub().fetch_count(), 1);
    }

    #[tokio::test]
    async fn should_fetch_again_when_forced() {
        let service = kitchen_service();
        service.refresh().await.unwrap();
        service.force_refresh().await.unwrap();
        assert_eq!(service.hub().fetch_count(), 2);
        assert_eq!(service.status().generation, 2);
    }

    #[tokio::test]
    async fn should_refresh_again_when_cooldown_elapsed() {
        let service = BridgeService::with_cooldown(
            StubHub::default(),
            InMemoryConfigRepo::default(),
            Duration::ZERO,
        );
        service.refresh().await.unwrap();
        service.refresh().await.unwrap();
        assert_eq!(service.hub().fetch_count(), 2);
    }

    #[tokio::test]
    async fn should_populate_cache_on_first_read() {
        let service = kitchen_service();
        let devices = service.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].state.on);
        assert_eq!(devices[0].state.bri, 127);
        assert_eq!(service.hub().fetch_count(), 1);
    }

    #[tokio::test]
    async fn should_list_devices_in_numeric_order() {
        let service = BridgeService::new(
            StubHub::default(),
            InMemoryConfigRepo::with_devices(vec![
                light(10, "light.a"),
                light(2, "light.b"),
                light(1, "light.c"),
            ]),
        );
        let ids: Vec<u32> = service
            .list_devices()
            .await
            .unwrap()
            .iter()
            .map(|d| d.id.value())
            .collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn should_synthesize_unreachable_device_when_entity_is_missing() {
        let service = BridgeService::new(
            StubHub::default(),
            InMemoryConfigRepo::with_devices(vec![light(1, "light.gone")]),
        );
        let device = service.get_device(HueId::new(1)).await.unwrap();
        assert!(!device.state.on);
        assert!(!device.state.reachable);
    }

    #[tokio::test]
    async fn should_expose_one_entity_under_several_ids() {
        let cover = VirtualDevice::builder()
            .hue_id(HueId::new(2))
            .name("Garage as cover")
            .entity_id("cover.garage")
            .device_type(DeviceType::Cover)
            .build()
            .unwrap();
        let service = BridgeService::new(
            StubHub::with_states(vec![raw(
                "cover.garage",
                "open",
                serde_json::json!({"current_position": 100}),
            )]),
            InMemoryConfigRepo::with_devices(vec![light(1, "cover.garage"), cover]),
        );
        let devices = service.list_devices().await.unwrap();
        assert_eq!(devices.len(), 2);
        assert!(!devices[0].state.on);
        assert!(devices[1].state.on);
        assert_eq!(devices[1].state.bri, 254);
    }

    #[tokio::test]
    async fn should_skip_refresh_when_hub_is_not_configured() {
        let service = kitchen_service();
        service.hub().unconfigured.store(true, Ordering::SeqCst);
        let devices = service.list_devices().await.unwrap();
        assert!(devices.is_empty());
        assert_eq!(service.hub().fetch_count(), 0);
        assert_eq!(service.status().generation, 0);
    }

    #[tokio::test]
    async fn should_propagate_fetch_error_on_first_read() {
        let service = kitchen_service();
        service.hub().fail_fetch.store(true, Ordering::SeqCst);
        let result = service.list_devices().await;
        assert!(matches!(result, Err(BridgeError::Hub(_))));
    }

    #[tokio::test]
    async fn should_keep_previous_generation_when_refresh_fails() {
        let service = BridgeService::with_cooldown(
            StubHub::with_states(vec![raw("light.kitchen", "on", serde_json::json!({}))]),
            InMemoryConfigRepo::with_devices(vec![light(1, "light.kitchen")]),
            Duration::ZERO,
        );
        service.refresh().await.unwrap();
        service.hub().fail_fetch.store(true, Ordering::SeqCst);
        assert!(service.refresh().await.is_err());
        let devices = service.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].state.on);
    }

    #[tokio::test]
    async fn should_return_not_found_when_device_is_unknown() {
        let service = kitchen_service();
        let result = service.get_device(HueId::new(42)).await;
        assert!(matches!(result, Err(BridgeError::NotFound(_))));
        let result = service
            .set_state(HueId::new(42), StateUpdate::default())
            .await;
        assert!(matches!(result, Err(BridgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_hand_out_copies_of_cached_devices() {
        let service = kitchen_service();
        let mut device = service.get_device(HueId::new(1)).await.unwrap();
        device.state.on = false;
        device.name = "changed".into();
        let again = service.get_device(HueId::new(1)).await.unwrap();
        assert!(again.state.on);
        assert_eq!(again.name, "Light 1");
    }

    #[tokio::test]
    async fn should_apply_state_optimistically_and_dispatch_action() {
        let service = kitchen_service();
        service
            .set_state(
                HueId::new(1),
                StateUpdate {
                    on: Some(false),
                    bri: None,
                },
            )
            .await
            .unwrap();

        let device = service.get_device(HueId::new(1)).await.unwrap();
        assert!(!device.state.on);
        assert_eq!(device.state.bri, 127);

        wait_for_calls(service.hub(), 1).await;
        let calls = service.hub().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "light.kitchen");
        assert_eq!(calls[0].1.service, "turn_off");
        assert_eq!(calls[0].1.data["entity_id"], "light.kitchen");
    }

    #[tokio::test]
    async fn should_not_call_hub_when_transition_is_suppressed() {
        let device = VirtualDevice::builder()
            .hue_id(HueId::new(1))
            .name("Doorbell")
            .entity_id("light.kitchen")
            .action_config(ActionConfig {
                no_op_off: true,
                ..ActionConfig::default()
            })
            .build()
            .unwrap();
        let service = BridgeService::new(
            StubHub::with_states(vec![raw("light.kitchen", "on", serde_json::json!({}))]),
            InMemoryConfigRepo::with_devices(vec![device]),
        );

        let result = service
            .set_state(
                HueId::new(1),
                StateUpdate {
                    on: Some(false),
                    bri: None,
                },
            )
            .await;
        assert!(result.is_ok());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(service.hub().calls().is_empty());
        assert!(service.get_device(HueId::new(1)).await.unwrap().state.on);
    }

    #[tokio::test]
    async fn should_dispatch_effect_after_primary_action() {
        let device = VirtualDevice::builder()
            .hue_id(HueId::new(1))
            .name("Porch")
            .entity_id("light.kitchen")
            .action_config(ActionConfig {
                on_effect: Some("script.chime".into()),
                ..ActionConfig::default()
            })
            .build()
            .unwrap();
        let service = BridgeService::new(
            StubHub::with_states(vec![raw("light.kitchen", "off", serde_json::json!({}))]),
            InMemoryConfigRepo::with_devices(vec![device]),
        );

        service
            .set_state(
                HueId::new(1),
                StateUpdate {
                    on: Some(true),
                    bri: Some(200),
                },
            )
            .await
            .unwrap();

        wait_for_calls(service.hub(), 2).await;
        let services: Vec<String> = service
            .hub()
            .calls()
            .into_iter()
            .map(|(_, action)| action.service)
            .collect();
        assert_eq!(services, vec!["turn_on".to_string(), "script.chime".to_string()]);
    }

    #[tokio::test]
    async fn should_keep_optimistic_state_when_hub_call_fails() {
        let service = kitchen_service();
        service.hub().fail_calls.store(true, Ordering::SeqCst);
        service
            .set_state(
                HueId::new(1),
                StateUpdate {
                    on: None,
                    bri: Some(40),
                },
            )
            .await
            .unwrap();
        wait_for_calls(service.hub(), 1).await;
        let device = service.get_device(HueId::new(1)).await.unwrap();
        assert_eq!(device.state.bri, 40);
    }

    #[tokio::test]
    async fn should_keep_existing_ids_and_assign_new_ones_on_update() {
        let service = kitchen_service();
        service.list_devices().await.unwrap();

        let mut config = service.config().await.unwrap();
        config.virtual_devices[0].hue_id = Some(HueId::new(3));
        config.virtual_devices.push(
            VirtualDevice::builder()
                .name("Hall")
                .entity_id("light.hall")
                .build()
                .unwrap(),
        );

        let stored = service.update_config(config).await.unwrap();
        assert_eq!(stored.virtual_devices[0].hue_id, Some(HueId::new(3)));
        assert_eq!(stored.virtual_devices[1].hue_id, Some(HueId::new(4)));
        assert_eq!(service.config().await.unwrap(), stored);

        // cooldown bypassed: the cache reflects the new config immediately
        assert_eq!(service.hub().fetch_count(), 2);
        let ids: Vec<u32> = service
            .list_devices()
            .await
            .unwrap()
            .iter()
            .map(|d| d.id.value())
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn should_assign_ids_above_stored_maximum() {
        let service = BridgeService::new(
            StubHub::default(),
            InMemoryConfigRepo::with_devices(vec![light(7, "light.old")]),
        );
        let config = BridgeConfig {
            virtual_devices: vec![
                VirtualDevice::builder().entity_id("light.new").build().unwrap(),
            ],
            ..BridgeConfig::default()
        };
        let stored = service.update_config(config).await.unwrap();
        assert_eq!(stored.virtual_devices[0].hue_id, Some(HueId::new(8)));
    }

    #[tokio::test]
    async fn should_reject_duplicate_ids_on_update() {
        let service = kitchen_service();
        let config = BridgeConfig {
            virtual_devices: vec![light(1, "light.a"), light(1, "light.b")],
            ..BridgeConfig::default()
        };
        let result = service.update_config(config).await;
        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::DuplicateHueId(_)))
        ));
        assert_eq!(service.config().await.unwrap().virtual_devices.len(), 1);
    }

    #[tokio::test]
    async fn should_reconfigure_hub_on_update() {
        let service = kitchen_service();
        let config = BridgeConfig {
            hub_url: "http://other:8123".into(),
            hub_token: "new-token".into(),
            ..BridgeConfig::default()
        };
        service.update_config(config).await.unwrap();
        assert_eq!(
            *service.hub().settings.lock().unwrap(),
            Some(HubSettings::new("http://other:8123", "new-token"))
        );
    }

    #[tokio::test]
    async fn should_keep_stored_config_when_hub_url_is_rejected() {
        let service = kitchen_service();
        service.list_devices().await.unwrap();
        let before = service.config().await.unwrap();

        let config = BridgeConfig {
            hub_url: "not a url".into(),
            hub_token: "token".into(),
            virtual_devices: vec![light(1, "light.kitchen"), light(2, "light.hall")],
            ..BridgeConfig::default()
        };
        let result = service.update_config(config).await;
        assert!(matches!(result, Err(BridgeError::Validation(_))));

        assert_eq!(service.config().await.unwrap(), before);
        assert!(service.hub().settings.lock().unwrap().is_none());
        assert_eq!(service.hub().fetch_count(), 1);
    }

    #[tokio::test]
    async fn should_restore_hub_settings_when_save_fails() {
        let service = kitchen_service();
        service.repo.fail_save.store(true, Ordering::SeqCst);
        let config = BridgeConfig {
            hub_url: "http://other:8123".into(),
            hub_token: "new-token".into(),
            ..BridgeConfig::default()
        };
        let result = service.update_config(config).await;
        assert!(matches!(result, Err(BridgeError::Storage(_))));
        assert_eq!(
            *service.hub().settings.lock().unwrap(),
            Some(HubSettings::new("http://hub.local:8123", "token"))
        );
    }

    #[tokio::test]
    async fn should_clear_cache_when_hub_is_unconfigured_by_update() {
        let service = kitchen_service();
        assert_eq!(service.list_devices().await.unwrap().len(), 1);

        service.hub().unconfigured.store(true, Ordering::SeqCst);
        service.update_config(BridgeConfig::default()).await.unwrap();

        assert!(service.list_devices().await.unwrap().is_empty());
        assert_eq!(service.status().device_count, 0);
    }

    #[tokio::test]
    async fn should_list_hub_entities_sorted() {
        let service = BridgeService::new(
            StubHub::with_states(vec![
                raw("switch.b", "on", serde_json::json!({"friendly_name": "B"})),
                raw("light.a", "off", serde_json::json!({})),
            ]),
            InMemoryConfigRepo::default(),
        );
        let entities = service.hub_entities().await.unwrap();
        assert_eq!(entities[0].entity_id, "light.a");
        assert_eq!(entities[1].friendly_name, "B");
    }

    #[tokio::test]
    async fn should_report_cache_status() {
        let service = kitchen_service();
        assert_eq!(service.status().generation, 0);
        assert!(service.status().refreshed_at.is_none());
        service.refresh().await.unwrap();
        let status = service.status();
        assert_eq!(status.generation, 1);
        assert_eq!(status.device_count, 1);
        assert!(status.refreshed_at.is_some());
        assert!(status.hub_configured);
    }

    #[tokio::test]
    async fn should_stop_refresh_loop_when_cancelled() {
        let service = Arc::new(BridgeService::with_cooldown(
            StubHub::default(),
            InMemoryConfigRepo::default(),
            Duration::ZERO,
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            let cancel = cancel.clone();
            async move {
                service
                    .run_refresh_loop(Duration::from_millis(10), cancel)
                    .await;
            }
        });

        for _ in 0..100 {
            if service.hub().fetch_count() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        handle.await.unwrap();
        assert!(service.hub().fetch_count() >= 2);
    }
}
