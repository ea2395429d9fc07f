//! Reqwest-backed implementation of [`HubPort`].

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use huemu_app::ports::HubPort;
use huemu_domain::config::HubSettings;
use huemu_domain::error::BridgeError;
use huemu_domain::hub::{HubAction, RawEntityState};

use crate::error::HubError;

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL and token of the hub currently in use.
struct Connection {
    base_url: Url,
    token: SecretString,
}

impl Connection {
    fn parse(settings: &HubSettings) -> Result<Self, HubError> {
        let raw = settings.url.trim();
        let mut base_url = Url::parse(raw).map_err(|source| HubError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        // relative joins below need a trailing slash
        let path = base_url.path().trim_end_matches('/').to_owned();
        base_url.set_path(&format!("{path}/"));
        Ok(Self {
            base_url,
            token: SecretString::from(settings.token.trim().to_string()),
        })
    }

    fn url(&self, path: &str) -> Result<Url, HubError> {
        self.base_url
            .join(path)
            .map_err(|source| HubError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                source,
            })
    }
}

/// Home Assistant REST client.
///
/// Connection settings can be swapped at runtime; requests in flight keep
/// the settings they started with.
pub struct HomeAssistantClient {
    http: reqwest::Client,
    connection: RwLock<Option<Arc<Connection>>>,
}

impl HomeAssistantClient {
    /// Create an unconfigured client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, HubError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::from_reqwest(http))
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self {
            http,
            connection: RwLock::new(None),
        }
    }

    fn connection(&self) -> Result<Arc<Connection>, HubError> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HubError::NotConfigured)
    }

    fn fetch_request(&self) -> Result<RequestBuilder, HubError> {
        let connection = self.connection()?;
        let url = connection.url("api/states")?;
        tracing::debug!("GET {url}");
        Ok(self
            .http
            .get(url)
            .bearer_auth(connection.token.expose_secret()))
    }

    fn action_request(
        &self,
        entity_id: &str,
        action: &HubAction,
    ) -> Result<RequestBuilder, HubError> {
        let connection = self.connection()?;
        let (domain, service) = action.target(entity_id);
        let url = connection.url(&format!("api/services/{domain}/{service}"))?;
        tracing::debug!(entity_id, "POST {url}");
        Ok(self
            .http
            .post(url)
            .bearer_auth(connection.token.expose_secret())
            .json(&action.data))
    }
}

async fn check(response: Response) -> Result<Response, HubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HubError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HubPort for HomeAssistantClient {
    fn is_configured(&self) -> bool {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn configure(&self, settings: &HubSettings) -> Result<(), BridgeError> {
        let connection = if settings.is_complete() {
            Some(Arc::new(Connection::parse(settings)?))
        } else {
            None
        };
        tracing::info!(configured = connection.is_some(), "hub connection updated");
        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = connection;
        Ok(())
    }

    fn fetch_states(&self) -> impl Future<Output = Result<Vec<RawEntityState>, BridgeError>> + Send {
        let request = self.fetch_request();
        async move {
            let response = check(request?.send().await.map_err(HubError::from)?).await?;
            let states = response
                .json::<Vec<RawEntityState>>()
                .await
                .map_err(HubError::from)?;
            Ok(states)
        }
    }

    fn call_action(
        &self,
        entity_id: &str,
        action: &HubAction,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let request = self.action_request(entity_id, action);
        async move {
            check(request?.send().await.map_err(HubError::from)?).await?;
            Ok(())
        }
    }
}
