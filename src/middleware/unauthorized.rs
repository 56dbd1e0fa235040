// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbound hook: unauthorized response detection.
//!
//! A single sink receives the signal. Registering again replaces the
//! previous sink.

use crate::models::SessionToken;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::{Arc, PoisonError, RwLock};

/// Receiver of the process-wide "session is no longer valid" signal.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    /// `sent` is the token the rejected request carried, if any.
    async fn on_unauthorized(&self, sent: Option<&SessionToken>);
}

/// Holder of the one active unauthorized sink.
#[derive(Clone, Default)]
pub struct UnauthorizedSignal {
    sink: Arc<RwLock<Option<Arc<dyn UnauthorizedHandler>>>>,
}

impl UnauthorizedSignal {
    /// Install `handler`, replacing any earlier registration.
    pub fn register(&self, handler: Arc<dyn UnauthorizedHandler>) {
        let mut sink = self.sink.write().unwrap_or_else(PoisonError::into_inner);
        if sink.replace(handler).is_some() {
            tracing::debug!("Replaced previously registered unauthorized handler");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Inspect a response status, firing the sink once on 401.
    ///
    /// Returns whether the sink was fired. The caller still propagates its
    /// own error.
    pub async fn inspect(&self, status: StatusCode, sent: Option<&SessionToken>) -> bool {
        if status != StatusCode::UNAUTHORIZED {
            return false;
        }
        let handler = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                tracing::warn!("Unauthorized response, signalling session invalidation");
                handler.on_unauthorized(sent).await;
                true
            }
            None => {
                tracing::warn!("Unauthorized response with no handler registered");
                false
            }
        }
    }
}
