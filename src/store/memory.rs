// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local backend for tests and ephemeral sessions.

use super::CredentialBackend;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryBackend {
    values: DashMap<String, String>,
}

#[async_trait]
impl CredentialBackend for MemoryBackend {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn store(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v.to_string());
            }
            None => {
                self.values.remove(key);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
