// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound hook: bearer credential injection.

use crate::error::Result;
use crate::models::SessionToken;
use crate::store::CredentialStore;
use reqwest::RequestBuilder;

/// Attach the stored session token as a bearer credential.
///
/// No token means no `Authorization` header; unauthenticated endpoints
/// still work. A storage failure is returned, never read as "no token".
/// The attached token is returned so a later 401 can be matched to the
/// session it was sent under.
pub async fn attach_credentials(
    request: RequestBuilder,
    store: &CredentialStore,
) -> Result<(RequestBuilder, Option<SessionToken>)> {
    match store.get().await? {
        Some(token) => Ok((request.bearer_auth(token.as_str()), Some(token))),
        None => Ok((request, None)),
    }
}
