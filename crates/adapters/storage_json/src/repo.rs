//! File-backed implementation of [`ConfigRepository`].

use std::ffi::OsString;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use huemu_app::ports::ConfigRepository;
use huemu_domain::config::BridgeConfig;
use huemu_domain::error::BridgeError;

use crate::error::StoreError;
use crate::legacy;

/// Version written into every saved document.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    schema_version: u32,
    #[serde(flatten)]
    config: BridgeConfig,
}

#[derive(Serialize)]
struct StoredDocumentRef<'a> {
    schema_version: u32,
    #[serde(flatten)]
    config: &'a BridgeConfig,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// JSON document store for the bridge configuration.
///
/// Reads and writes are serialized through an async mutex so a save never
/// races a concurrent migration.
pub struct JsonConfigRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonConfigRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("config.json"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<BridgeConfig, StoreError> {
        let _guard = self.lock.lock().await;

        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "no configuration file, starting empty");
                return Ok(BridgeConfig::default());
            }
            Err(err) => return Err(io_error(&self.path)(err)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BridgeConfig::default());
        }

        let document: StoredDocument = serde_json::from_slice(&bytes)?;
        if document.config.virtual_devices.is_empty()
            && let Some(migrated) = legacy::migrate(&bytes)
        {
            tracing::info!(
                path = ?self.path,
                devices = migrated.virtual_devices.len(),
                "migrated legacy entity mappings"
            );
            self.write(&migrated).await?;
            return Ok(migrated);
        }
        if document.schema_version > SCHEMA_VERSION {
            tracing::warn!(
                found = document.schema_version,
                supported = SCHEMA_VERSION,
                "configuration written by a newer version"
            );
        }
        Ok(document.config)
    }

    async fn store(&self, config: &BridgeConfig) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write(config).await
    }

    /// Write through a sibling temp file; callers hold the lock.
    async fn write(&self, config: &BridgeConfig) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&StoredDocumentRef {
            schema_version: SCHEMA_VERSION,
            config,
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, bytes).await.map_err(io_error(&temp))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(io_error(&self.path))?;
        tracing::debug!(path = ?self.path, "configuration saved");
        Ok(())
    }
}

impl ConfigRepository for JsonConfigRepository {
    fn get(&self) -> impl Future<Output = Result<BridgeConfig, BridgeError>> + Send {
        async move { Ok(self.load().await?) }
    }

    fn save(&self, config: &BridgeConfig) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move { Ok(self.store(config).await?) }
    }
}
