// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy with consistent user-facing notices.

use reqwest::StatusCode;
use serde::Deserialize;

/// Error type returned by every client operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    /// Malformed caller input, caught before transmission where possible.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Bad credentials on a login or registration exchange.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource absent while the session is still valid.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session invalid or expired. Triggers the global sign-out.
    #[error("Session expired or invalid")]
    Unauthorized,

    /// A device capability (location) was refused.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    /// Credential persistence failed. Never treated as "no token".
    #[error("Credential storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Any other non-success status from the backend.
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// JSON error body returned by the backend.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl AppError {
    /// Map a non-success status and its raw body to an error.
    ///
    /// `credential_exchange` selects how 401 is read: bad credentials on
    /// login/register, or an invalid session everywhere else.
    pub fn from_status(status: StatusCode, body: &str, credential_exchange: bool) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = match (parsed.error.is_empty(), parsed.details) {
            (false, Some(details)) => format!("{}: {}", parsed.error, details),
            (false, None) => parsed.error,
            (true, _) if !body.trim().is_empty() => body.trim().to_string(),
            (true, _) => status
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string(),
        };

        match status.as_u16() {
            400 | 422 => AppError::Validation(message),
            401 if credential_exchange => AppError::Auth(message),
            401 => AppError::Unauthorized,
            404 => AppError::NotFound(message),
            409 => AppError::Conflict(message),
            408 | 504 => AppError::Timeout,
            code => AppError::Api {
                status: code,
                message,
            },
        }
    }

    /// Text suitable for a dismissible notice in the UI.
    pub fn notice(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::PermissionDenied(msg) => msg.clone(),
            AppError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else if err.is_decode() {
            AppError::InvalidResponse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, AppError>;
