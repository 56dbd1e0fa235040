// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Domain client: one typed operation per backend capability.
//!
//! Every operation is a single request/response pair. Nothing is retried,
//! so non-idempotent exchanges (register, login) run at most once.

use crate::error::{AppError, Result};
use crate::models::{
    Credentials, FindRequest, FindResponse, IdentityTokenLogin, Profile, SessionToken,
    TokenResponse,
};
use crate::services::http::{ApiTransport, CallKind};
use reqwest::Method;
use serde::Deserialize;
use validator::Validate;

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGIN_PATH: &str = "/auth/login";
pub const IDENTITY_LOGIN_PATH: &str = "/auth/login/google";
pub const PROFILE_PATH: &str = "/me/profile";
pub const MATCH_FIND_PATH: &str = "/match/find";

/// Typed operations against the matching backend.
#[derive(Clone)]
pub struct TennisApi {
    transport: ApiTransport,
}

impl TennisApi {
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &ApiTransport {
        &self.transport
    }

    /// Create an account. Fails with `Validation` or `Conflict`.
    pub async fn register(&self, credentials: &Credentials) -> Result<SessionToken> {
        credentials.validate()?;
        let resp: TokenResponse = self
            .transport
            .send_json(
                Method::POST,
                REGISTER_PATH,
                credentials,
                CallKind::CredentialExchange,
            )
            .await?;
        tracing::info!(email = %credentials.email, "Account registered");
        Ok(resp.token)
    }

    /// Log in with email and password. Fails with `Auth` on bad credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionToken> {
        credentials.validate()?;
        let resp: TokenResponse = self
            .transport
            .send_json(
                Method::POST,
                LOGIN_PATH,
                credentials,
                CallKind::CredentialExchange,
            )
            .await?;
        tracing::info!(email = %credentials.email, "Logged in");
        Ok(resp.token)
    }

    /// Log in with an identity-provider ID token.
    pub async fn login_with_identity_token(&self, id_token: &str) -> Result<SessionToken> {
        let body = IdentityTokenLogin {
            id_token: id_token.to_string(),
        };
        body.validate()?;
        let resp: TokenResponse = self
            .transport
            .send_json(
                Method::POST,
                IDENTITY_LOGIN_PATH,
                &body,
                CallKind::CredentialExchange,
            )
            .await?;
        tracing::info!("Logged in with identity token");
        Ok(resp.token)
    }

    /// Fetch the profile. `NotFound` means none has been created yet.
    pub async fn get_profile(&self) -> Result<Profile> {
        self.transport.get_json(PROFILE_PATH).await
    }

    /// Replace the profile with `profile` in full.
    ///
    /// Backends that acknowledge with `{"ok": true}` instead of echoing
    /// the profile get the submitted profile back.
    pub async fn put_profile(&self, profile: &Profile) -> Result<Profile> {
        profile.validate()?;
        let raw = self
            .transport
            .send_raw(Method::PUT, PROFILE_PATH, profile, CallKind::Session)
            .await?;

        if let Ok(saved) = serde_json::from_str::<Profile>(&raw) {
            return Ok(saved);
        }
        match serde_json::from_str::<Acknowledgement>(&raw) {
            Ok(Acknowledgement { ok: true }) => Ok(profile.clone()),
            _ => Err(AppError::InvalidResponse(format!(
                "{PROFILE_PATH}: expected profile or acknowledgement"
            ))),
        }
    }

    /// Run a match search. Candidates and suggestions come back in
    /// backend order.
    pub async fn find_matches(&self, request: &FindRequest) -> Result<FindResponse> {
        request.validate()?;
        let resp: FindResponse = self
            .transport
            .send_json(Method::POST, MATCH_FIND_PATH, request, CallKind::Session)
            .await?;
        tracing::debug!(
            candidates = resp.candidates.len(),
            suggestions = resp.suggestions.len(),
            "Match search completed"
        );
        Ok(resp)
    }
}

#[derive(Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    ok: bool,
}
