// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location capability.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current coordinates, or `PermissionDenied` if the user refused.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Reports a position fixed at startup. No position means the
/// capability was refused.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    position: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.device_location)
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates> {
        self.position
            .ok_or_else(|| AppError::PermissionDenied("Location permission denied".to_string()))
    }
}
