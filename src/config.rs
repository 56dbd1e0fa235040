// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! Endpoint resolution prefers an explicit override, then a host inferred
//! from the local development environment, then a fixed default. Only the
//! override is validated strictly; inference fails closed to the default.

use crate::models::Coordinates;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Endpoint used when nothing better is known.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Port the backend listens on during local development.
const DEV_BACKEND_PORT: u16 = 8080;

/// Transport-level bound applied to every outbound call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime platform the client is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Web,
    Desktop,
}

impl Platform {
    /// Platform implied by the compilation target.
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    pub fn is_native(self) -> bool {
        self != Platform::Web
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "web" => Ok(Platform::Web),
            "desktop" => Ok(Platform::Desktop),
            other => Err(ConfigError::Invalid("TENNIS_PLATFORM", other.to_string())),
        }
    }
}

/// Which medium persists the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialBackendKind {
    /// OS secure credential store (encrypted at rest).
    Keyring,
    /// Local persistent key/value document.
    File,
    /// Process memory only.
    Memory,
}

impl CredentialBackendKind {
    /// Default medium for a platform.
    pub fn default_for(platform: Platform) -> Self {
        if platform.is_native() && cfg!(feature = "keyring") {
            CredentialBackendKind::Keyring
        } else {
            CredentialBackendKind::File
        }
    }
}

impl FromStr for CredentialBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(CredentialBackendKind::Keyring),
            "file" => Ok(CredentialBackendKind::File),
            "memory" => Ok(CredentialBackendKind::Memory),
            other => Err(ConfigError::Invalid(
                "TENNIS_CREDENTIAL_STORE",
                other.to_string(),
            )),
        }
    }
}

/// Identity-provider client ids used for social login.
#[derive(Debug, Clone, Default)]
pub struct GoogleClientIds {
    pub generic: Option<String>,
    pub android: Option<String>,
    pub ios: Option<String>,
}

impl GoogleClientIds {
    /// Client id for a platform, falling back to the generic id.
    pub fn for_platform(&self, platform: Platform) -> Option<&str> {
        let specific = match platform {
            Platform::Android => self.android.as_deref(),
            Platform::Ios => self.ios.as_deref(),
            Platform::Web | Platform::Desktop => None,
        };
        specific.or(self.generic.as_deref())
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every request path is appended to (ends in `/api`)
    pub api_base: Url,
    pub platform: Platform,
    pub request_timeout: Duration,
    pub credential_backend: CredentialBackendKind,
    /// File backend location
    pub credential_path: PathBuf,
    pub google_client_ids: GoogleClientIds,
    /// Position reported by the fixed location provider
    pub device_location: Option<Coordinates>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            platform: Platform::Desktop,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            credential_backend: CredentialBackendKind::Memory,
            credential_path: PathBuf::from("credentials.json"),
            google_client_ids: GoogleClientIds::default(),
            device_location: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let platform = match non_empty_var("TENNIS_PLATFORM") {
            Some(v) => v.parse()?,
            None => Platform::current(),
        };

        let api_base = resolve_api_base(
            non_empty_var("TENNIS_API_BASE").as_deref(),
            non_empty_var("TENNIS_DEV_HOST").as_deref(),
            platform,
        )?;

        let request_timeout = match non_empty_var("TENNIS_REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid("TENNIS_REQUEST_TIMEOUT_SECS", v))?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let credential_backend = match non_empty_var("TENNIS_CREDENTIAL_STORE") {
            Some(v) => v.parse()?,
            None => CredentialBackendKind::default_for(platform),
        };

        let credential_path = match non_empty_var("TENNIS_CREDENTIAL_PATH") {
            Some(p) => PathBuf::from(p),
            None => default_credential_path()?,
        };

        let device_location = match (
            non_empty_var("TENNIS_DEVICE_LAT"),
            non_empty_var("TENNIS_DEVICE_LNG"),
        ) {
            (Some(lat), Some(lng)) => Some(parse_coordinates(&lat, &lng)?),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TENNIS_DEVICE_LNG")),
            (None, Some(_)) => return Err(ConfigError::Missing("TENNIS_DEVICE_LAT")),
        };

        Ok(Self {
            api_base,
            platform,
            request_timeout,
            credential_backend,
            credential_path,
            google_client_ids: GoogleClientIds {
                generic: non_empty_var("TENNIS_GOOGLE_CLIENT_ID"),
                android: non_empty_var("TENNIS_GOOGLE_ANDROID_CLIENT_ID"),
                ios: non_empty_var("TENNIS_GOOGLE_IOS_CLIENT_ID"),
            },
            device_location,
        })
    }

    /// Test config pointing at a specific backend.
    pub fn for_base(api_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: parse_base(api_base)?,
            ..Self::default()
        })
    }
}

/// Resolve the endpoint base.
///
/// An explicit override wins and must be a valid URL. Otherwise, on
/// native platforms, the host part of the development host URI is used
/// with the backend port. Anything unusable falls back to the default.
pub fn resolve_api_base(
    explicit: Option<&str>,
    dev_host: Option<&str>,
    platform: Platform,
) -> Result<Url, ConfigError> {
    if let Some(explicit) = explicit {
        return parse_base(explicit);
    }

    if platform.is_native() {
        if let Some(host) = dev_host.and_then(dev_host_name) {
            let candidate = format!("http://{}:{}/api", host, DEV_BACKEND_PORT);
            match parse_base(&candidate) {
                Ok(url) => return Ok(url),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unusable development host");
                }
            }
        }
    }

    Ok(default_api_base())
}

/// Host portion of a `host[:port]` development URI.
fn dev_host_name(uri: &str) -> Option<&str> {
    let host = uri.split(':').next()?.trim();
    (!host.is_empty()).then_some(host)
}

/// Parse a base URL, normalizing it to end with `/` so paths join under it.
fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{}/", trimmed))
        .map_err(|e| ConfigError::Invalid("TENNIS_API_BASE", format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("TENNIS_API_BASE", raw.to_string()));
    }
    Ok(url)
}

fn default_api_base() -> Url {
    Url::parse(&format!("{}/", DEFAULT_API_BASE)).expect("default API base is a valid URL")
}

fn default_credential_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("tennis-match").join("credentials.json"))
        .ok_or(ConfigError::Missing("TENNIS_CREDENTIAL_PATH"))
}

fn parse_coordinates(lat: &str, lng: &str) -> Result<Coordinates, ConfigError> {
    let lat: f64 = lat
        .parse()
        .map_err(|_| ConfigError::Invalid("TENNIS_DEVICE_LAT", lat.to_string()))?;
    let lng: f64 = lng
        .parse()
        .map_err(|_| ConfigError::Invalid("TENNIS_DEVICE_LNG", lng.to_string()))?;
    Coordinates::new(lat, lng)
        .map_err(|e| ConfigError::Invalid("TENNIS_DEVICE_LAT", e.to_string()))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
