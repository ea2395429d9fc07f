//! Daemon settings: TOML file with environment variable overrides.
//!
//! Looks for `huemu.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use huemu_adapter_ssdp::SsdpConfig;
use huemu_domain::config::HubSettings;

/// Top-level settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Discovery responder settings.
    pub discovery: DiscoverySettings,
    /// Seed connection settings for the hub.
    pub hub: HubSection,
    /// Configuration document location.
    pub storage: StorageSettings,
    /// Cache refresh timing.
    pub refresh: RefreshSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port, also advertised to discovery clients.
    pub port: u16,
    /// Address advertised to discovery clients; detected when unset.
    pub advertise_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub enabled: bool,
    pub multicast_addr: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubSection {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Path of the JSON configuration document.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Period of the background refresh.
    pub interval_secs: u64,
    /// Minimum spacing between two refreshes.
    pub cooldown_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Settings {
    /// Load settings from `huemu.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting settings are invalid.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::from_file("huemu.toml")?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &str) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(SettingsError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(SettingsError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HUEMU_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("HUEMU_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("HUEMU_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("LOCAL_IP").filter(|v| !v.trim().is_empty()) {
            self.server.advertise_ip = Some(val);
        }
        if let Some(val) = var("HASS_URL") {
            self.hub.url = Some(val);
        }
        if let Some(val) = var("HASS_TOKEN") {
            self.hub.token = Some(val);
        }
        if let Some(val) = var("CONFIG_PATH") {
            self.storage.path = PathBuf::from(val);
        }
        if let Some(val) = var("HUEMU_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.server.port == 0 {
            return Err(SettingsError::Validation("port must be non-zero".to_string()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(SettingsError::Validation(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        if self.hub.timeout_secs == 0 {
            return Err(SettingsError::Validation(
                "hub timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Hub settings to seed an empty stored configuration with.
    #[must_use]
    pub fn hub_seed(&self) -> Option<HubSettings> {
        let settings = HubSettings::new(
            self.hub.url.as_deref().unwrap_or_default().trim(),
            self.hub.token.as_deref().unwrap_or_default().trim(),
        );
        settings.is_complete().then_some(settings)
    }

    #[must_use]
    pub fn hub_timeout(&self) -> Duration {
        Duration::from_secs(self.hub.timeout_secs)
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh.cooldown_secs)
    }

    #[must_use]
    pub fn ssdp_config(&self) -> SsdpConfig {
        SsdpConfig {
            multicast_addr: self.discovery.multicast_addr,
            port: self.discovery.port,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            advertise_ip: None,
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        let ssdp = SsdpConfig::default();
        Self {
            enabled: true,
            multicast_addr: ssdp.multicast_addr,
            port: ssdp.port,
        }
    }
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 10,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.json"),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            cooldown_secs: 2,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "huemud=info,huemu=info,tower_http=debug".to_string(),
        }
    }
}

/// Settings errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// TOML parse failure.
    #[error("failed to parse settings file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid settings: {0}")]
    Validation(String),
}
