// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OS secure credential store backend (Keychain, Credential Manager,
//! Secret Service).

use super::CredentialBackend;
use crate::error::{AppError, Result};
use async_trait::async_trait;

pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    /// Service name entries are filed under.
    pub const SERVICE: &'static str = "TennisMatch.Session";

    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(::keyring::Entry) -> std::result::Result<T, ::keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = ::keyring::Entry::new(&service, &key)?;
            op(entry)
        })
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("keyring task failed: {e}")))?
        .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }
}

#[async_trait]
impl CredentialBackend for KeyringBackend {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn store(&self, key: &str, value: Option<&str>) -> Result<()> {
        let value = value.map(str::to_string);
        self.with_entry(key, move |entry| match value {
            Some(v) => entry.set_password(&v),
            None => match entry.delete_credential() {
                Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e),
            },
        })
        .await
    }

    fn name(&self) -> &'static str {
        "keyring"
    }
}
