// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owned client context.
//!
//! `TennisClient` replaces ambient global session state: it is built once,
//! wires the session controller in as the unauthorized sink, and is handed
//! to whatever needs to talk to the backend.

use crate::config::Config;
use crate::error::Result;
use crate::models::{Credentials, FindRequest, FindResponse, Profile, SessionToken};
use crate::services::{
    ApiTransport, CacheCoordinator, CacheKey, FixedLocation, LocationProvider, MatchSearch,
    SessionController, SessionStatus, TennisApi,
};
use crate::store::CredentialStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared client state.
#[derive(Clone)]
pub struct TennisClient {
    config: Arc<Config>,
    api: TennisApi,
    session: Arc<SessionController>,
    cache: CacheCoordinator,
    location: Arc<dyn LocationProvider>,
}

impl TennisClient {
    /// Build a client on an explicit credential store.
    pub fn new(config: Config, store: CredentialStore) -> Result<Self> {
        let location: Arc<dyn LocationProvider> = Arc::new(FixedLocation::from_config(&config));
        Self::with_location(config, store, location)
    }

    /// Build a client with a custom location capability.
    pub fn with_location(
        config: Config,
        store: CredentialStore,
        location: Arc<dyn LocationProvider>,
    ) -> Result<Self> {
        let transport = ApiTransport::new(&config, store.clone())?;
        let cache = CacheCoordinator::new();
        let session = SessionController::new(store, cache.clone());
        session.attach(transport.unauthorized_signal());

        Ok(Self {
            config: Arc::new(config),
            api: TennisApi::new(transport),
            session,
            cache,
            location,
        })
    }

    /// Build a client using the configured credential backend.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = CredentialStore::from_config(&config)?;
        Self::new(config, store)
    }

    /// Restore the stored session. Call once at startup.
    pub async fn start(&self) -> SessionStatus {
        self.session.restore().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &TennisApi {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn cache(&self) -> &CacheCoordinator {
        &self.cache
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.session.subscribe()
    }

    /// Identity-provider client id for the configured platform.
    pub fn google_client_id(&self) -> Option<&str> {
        self.config
            .google_client_ids
            .for_platform(self.config.platform)
    }

    /// Create an account and start a session with it.
    pub async fn register(&self, credentials: &Credentials) -> Result<SessionToken> {
        let token = self.api.register(credentials).await?;
        self.session.sign_in(token.clone()).await?;
        Ok(token)
    }

    /// Log in and start a session. On failure the current session is untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionToken> {
        let token = self.api.login(credentials).await?;
        self.session.sign_in(token.clone()).await?;
        Ok(token)
    }

    pub async fn login_with_identity_token(&self, id_token: &str) -> Result<SessionToken> {
        let token = self.api.login_with_identity_token(id_token).await?;
        self.session.sign_in(token.clone()).await?;
        Ok(token)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.session.sign_out().await
    }

    /// Current profile, served from the session cache when fresh.
    pub async fn profile(&self) -> Result<Profile> {
        let api = self.api.clone();
        self.cache
            .get_or_fetch(CacheKey::Profile, || async move { api.get_profile().await })
            .await
    }

    /// Replace the profile. The cached copy is invalidated, not patched.
    pub async fn save_profile(&self, profile: &Profile) -> Result<Profile> {
        let saved = self.api.put_profile(profile).await?;
        self.cache.invalidate(&CacheKey::Profile);
        Ok(saved)
    }

    pub async fn find_matches(&self, request: &FindRequest) -> Result<FindResponse> {
        self.api.find_matches(request).await
    }

    /// Start a match search workflow bound to this client's session.
    pub fn match_search(&self) -> MatchSearch {
        MatchSearch::new(
            self.api.clone(),
            self.session.clone(),
            self.location.clone(),
        )
    }
}
