// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Credential exchange payloads and the opaque session token.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Opaque credential proving an authenticated identity to the backend.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} bytes>)", self.0.len())
    }
}

/// Email/password pair for register and login.
#[derive(Clone, Serialize, Validate)]
#[validate(schema(function = "validate_credentials"))]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity-provider ID token for social login.
#[derive(Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_identity_token"))]
pub struct IdentityTokenLogin {
    pub id_token: String,
}

/// Response body of every credential exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: SessionToken,
}

fn validate_credentials(creds: &Credentials) -> Result<(), ValidationError> {
    if creds.email.trim().is_empty() || creds.password.is_empty() {
        return Err(ValidationError::new("email_password_required"));
    }
    Ok(())
}

fn validate_identity_token(login: &IdentityTokenLogin) -> Result<(), ValidationError> {
    if login.id_token.trim().is_empty() {
        return Err(ValidationError::new("id_token_required"));
    }
    Ok(())
}
