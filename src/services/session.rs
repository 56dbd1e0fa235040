// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session Controller: the single writer of process-wide auth state.
//!
//! States are `Loading` (until the stored token has been read),
//! `Anonymous` and `Authenticated(token)`. Every transition clears the
//! derived caches and advances the session epoch; responses tagged with
//! an older epoch belong to a session that no longer exists.

use crate::error::{AppError, Result};
use crate::middleware::{UnauthorizedHandler, UnauthorizedSignal};
use crate::models::SessionToken;
use crate::services::cache::CacheCoordinator;
use crate::store::CredentialStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Stored credential not read yet; defer navigation decisions.
    Loading,
    Anonymous,
    Authenticated(SessionToken),
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            SessionStatus::Authenticated(token) => Some(token),
            _ => None,
        }
    }
}

/// Why the session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    Explicit,
    Unauthorized,
}

/// Owns the session lifecycle.
pub struct SessionController {
    store: CredentialStore,
    cache: CacheCoordinator,
    status: watch::Sender<SessionStatus>,
    epoch: AtomicU64,
    /// Serializes transitions.
    transition: Mutex<()>,
}

impl SessionController {
    pub fn new(store: CredentialStore, cache: CacheCoordinator) -> Arc<Self> {
        let (status, _) = watch::channel(SessionStatus::Loading);
        Arc::new(Self {
            store,
            cache,
            status,
            epoch: AtomicU64::new(0),
            transition: Mutex::new(()),
        })
    }

    /// Become the process-wide unauthorized sink.
    pub fn attach(self: &Arc<Self>, signal: &UnauthorizedSignal) {
        signal.register(self.clone());
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every distinct state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Identifier of the current session context.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch() == epoch
    }

    /// Read the stored token and leave `Loading`.
    ///
    /// A storage failure fails closed to `Anonymous`.
    pub async fn restore(&self) -> SessionStatus {
        let _guard = self.transition.lock().await;

        if self.status() != SessionStatus::Loading {
            return self.status();
        }

        let next = match self.store.get().await {
            Ok(Some(token)) => SessionStatus::Authenticated(token),
            Ok(None) => SessionStatus::Anonymous,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = self.store.backend_name(),
                    "Session restore failed, continuing signed out"
                );
                SessionStatus::Anonymous
            }
        };

        tracing::info!(
            authenticated = next.is_authenticated(),
            "Session restored"
        );
        self.publish(next.clone());
        next
    }

    /// Start a session with a freshly issued token.
    ///
    /// The token is persisted first; if that fails nothing changes. An
    /// existing session is torn down before the new one starts.
    pub async fn sign_in(&self, token: SessionToken) -> Result<()> {
        let _guard = self.transition.lock().await;

        self.store.set(Some(&token)).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist session token");
            e
        })?;

        if self.status().is_authenticated() {
            tracing::info!("Replacing existing session");
            self.enter(SessionStatus::Anonymous);
        }
        self.enter(SessionStatus::Authenticated(token));

        tracing::info!(epoch = self.epoch(), "Signed in");
        Ok(())
    }

    /// End the session explicitly.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.transition.lock().await;
        self.end_session(SignOutReason::Explicit).await
    }

    /// End the session a rejected request was sent under.
    ///
    /// A 401 for a token other than the current one belongs to a session
    /// that has already been replaced and is ignored.
    async fn expire(&self, sent: Option<&SessionToken>) -> Result<()> {
        let _guard = self.transition.lock().await;

        if self.status().token() != sent {
            tracing::debug!(
                epoch = self.epoch(),
                "Ignoring unauthorized response from an earlier session"
            );
            return Ok(());
        }
        self.end_session(SignOutReason::Unauthorized).await
    }

    /// Idempotent teardown shared by explicit and unauthorized sign-out.
    /// Callers hold the transition lock.
    ///
    /// The in-memory state always ends `Anonymous`; a storage failure is
    /// still reported to the caller.
    async fn end_session(&self, reason: SignOutReason) -> Result<()> {
        let cleared = self.store.set(None).await;
        if let Err(e) = &cleared {
            tracing::error!(error = %e, ?reason, "Failed to clear stored session token");
        }

        if self.status() == SessionStatus::Anonymous {
            tracing::debug!(?reason, "Already signed out");
            return cleared;
        }

        self.enter(SessionStatus::Anonymous);
        tracing::info!(?reason, epoch = self.epoch(), "Signed out");
        cleared
    }

    /// Advance the epoch, purge caches, then publish.
    fn enter(&self, next: SessionStatus) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.clear_all();
        self.publish(next);
    }

    fn publish(&self, next: SessionStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[async_trait]
impl UnauthorizedHandler for SessionController {
    async fn on_unauthorized(&self, sent: Option<&SessionToken>) {
        match self.expire(sent).await {
            Ok(()) => {}
            Err(AppError::StorageUnavailable(msg)) => {
                tracing::error!(error = %msg, "Session cleared in memory only");
            }
            Err(e) => tracing::error!(error = %e, "Unexpected sign-out failure"),
        }
    }
}
