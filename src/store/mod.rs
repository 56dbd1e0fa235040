// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential Store: durable persistence of the single session token.
//!
//! The medium is chosen once at startup (OS keyring, a local key/value
//! file, or memory). Every backend honors the same contract: a write has
//! reached the medium before `set` returns, "no token" is `Ok(None)`, and
//! a broken medium is `AppError::StorageUnavailable`.

pub mod file;
#[cfg(feature = "keyring")]
pub mod keyring;
pub mod memory;

pub use file::FileBackend;
#[cfg(feature = "keyring")]
pub use self::keyring::KeyringBackend;
pub use memory::MemoryBackend;

use crate::config::{Config, CredentialBackendKind};
use crate::error::{AppError, Result};
use crate::models::SessionToken;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key under which the session token is stored.
pub const TOKEN_KEY: &str = "token";

/// A storage medium for string values keyed by name.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Read a value. Absence is `Ok(None)`.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write (`Some`) or delete (`None`) a value durably.
    async fn store(&self, key: &str, value: Option<&str>) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Serialized access to the session token.
///
/// Reads and writes take the same lock, so a read never observes a
/// half-finished write. Only the session controller writes.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn CredentialBackend>,
    lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self {
            backend,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Build the store selected by configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn CredentialBackend> = match config.credential_backend {
            CredentialBackendKind::Memory => Arc::new(MemoryBackend::default()),
            CredentialBackendKind::File => Arc::new(FileBackend::new(&config.credential_path)),
            #[cfg(feature = "keyring")]
            CredentialBackendKind::Keyring => Arc::new(KeyringBackend::new(KeyringBackend::SERVICE)),
            #[cfg(not(feature = "keyring"))]
            CredentialBackendKind::Keyring => {
                return Err(AppError::StorageUnavailable(
                    "keyring support is not built into this binary".to_string(),
                ))
            }
        };
        tracing::debug!(backend = backend.name(), "Credential store selected");
        Ok(Self::new(backend))
    }

    /// Current token, if any.
    pub async fn get(&self) -> Result<Option<SessionToken>> {
        let _guard = self.lock.lock().await;
        let value = self.backend.load(TOKEN_KEY).await.map_err(storage_error)?;
        Ok(value.filter(|v| !v.is_empty()).map(SessionToken::new))
    }

    /// Replace or remove the token.
    pub(crate) async fn set(&self, token: Option<&SessionToken>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.backend
            .store(TOKEN_KEY, token.map(SessionToken::as_str))
            .await
            .map_err(storage_error)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

/// Backends may report failures in any variant; callers only see one.
fn storage_error(err: AppError) -> AppError {
    match err {
        AppError::StorageUnavailable(_) => err,
        other => AppError::StorageUnavailable(other.to_string()),
    }
}
