//! Stub ports and request helpers shared by the router tests.

use std::future::Future;
use std::sync::Mutex;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_app::services::bridge_service::BridgeService;
use huemu_domain::config::{BridgeConfig, HubSettings};
use huemu_domain::device::VirtualDevice;
use huemu_domain::error::BridgeError;
use huemu_domain::hub::{HubAction, RawEntityState};
use huemu_domain::id::HueId;

use crate::state::{Advertise, AppState};

#[derive(Default)]
pub struct StubHub {
    pub states: Mutex<Vec<RawEntityState>>,
    pub calls: Mutex<Vec<(String, HubAction)>>,
}

impl HubPort for StubHub {
    fn is_configured(&self) -> bool {
        true
    }

    fn configure(&self, _settings: &HubSettings) -> Result<(), BridgeError> {
        Ok(())
    }

    fn fetch_states(&self) -> impl Future<Output = Result<Vec<RawEntityState>, BridgeError>> + Send {
        let states = self.states.lock().unwrap().clone();
        async { Ok(states) }
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
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct InMemoryConfigRepo {
    pub config: Mutex<BridgeConfig>,
}

impl ConfigRepository for InMemoryConfigRepo {
    fn get(&self) -> impl Future<Output = Result<BridgeConfig, BridgeError>> + Send {
        let config = self.config.lock().unwrap().clone();
        async { Ok(config) }
    }

    fn save(&self, config: &BridgeConfig) -> impl Future<Output = Result<(), BridgeError>> + Send {
        *self.config.lock().unwrap() = config.clone();
        async { Ok(()) }
    }
}

pub type TestState = AppState<StubHub, InMemoryConfigRepo>;

pub fn state(devices: Vec<VirtualDevice>, states: Vec<RawEntityState>) -> TestState {
    let hub = StubHub {
        states: Mutex::new(states),
        ..StubHub::default()
    };
    let repo = InMemoryConfigRepo {
        config: Mutex::new(BridgeConfig {
            hub_url: "http://hub.local:8123".into(),
            hub_token: "token".into(),
            local_ip: None,
            virtual_devices: devices,
        }),
    };
    AppState::new(
        BridgeService::new(hub, repo),
        Advertise {
            ip: "192.168.1.20".into(),
            port: 80,
        },
    )
}

pub fn light(id: u32, name: &str, entity_id: &str) -> VirtualDevice {
    VirtualDevice::builder()
        .hue_id(HueId::new(id))
        .name(name)
        .entity_id(entity_id)
        .build()
        .unwrap()
}

pub fn raw(entity_id: &str, state: &str, attributes: serde_json::Value) -> RawEntityState {
    RawEntityState {
        entity_id: entity_id.into(),
        state: state.into(),
        attributes: attributes.as_object().cloned().unwrap_or_default(),
    }
}

/// Send a request and decode the JSON response body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
