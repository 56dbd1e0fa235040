// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request pipeline: every backend call goes through `ApiTransport`.
//!
//! Handles:
//! - Endpoint resolution against the configured base
//! - Bearer credential injection from the credential store
//! - Unauthorized detection (fires the registered sink, then propagates)
//! - Uniform transport timeout and status-to-error mapping

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::{attach_credentials, UnauthorizedSignal};
use crate::store::CredentialStore;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

/// How a call relates to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Runs under the current session. A 401 means the session is gone.
    Session,
    /// Exchanges credentials for a token. A 401 means bad credentials and
    /// leaves the current session untouched.
    CredentialExchange,
}

/// HTTP transport for the matching backend.
#[derive(Clone)]
pub struct ApiTransport {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialStore,
    unauthorized: UnauthorizedSignal,
}

impl ApiTransport {
    /// Create a transport with the configured base and timeout.
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Network(format!("failed building HTTP client: {e}")))?;

        tracing::info!(
            base_url = %config.api_base,
            timeout_secs = config.request_timeout.as_secs_f64(),
            "API transport initialized"
        );

        Ok(Self {
            http,
            base_url: config.api_base.clone(),
            credentials,
            unauthorized: UnauthorizedSignal::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Sink registration point for the session controller.
    pub fn unauthorized_signal(&self) -> &UnauthorizedSignal {
        &self.unauthorized
    }

    /// GET a JSON resource under the current session.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self
            .execute(Method::GET, path, None::<&()>, CallKind::Session)
            .await?;
        decode(path, &body)
    }

    /// Send a JSON body and decode a JSON response.
    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        kind: CallKind,
    ) -> Result<T> {
        let raw = self.execute(method, path, Some(body), kind).await?;
        decode(path, &raw)
    }

    /// Send a JSON body and return the raw response text.
    pub async fn send_raw<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        kind: CallKind,
    ) -> Result<String> {
        self.execute(method, path, Some(body), kind).await
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Validation(format!("bad request path {path}: {e}")))
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        kind: CallKind,
    ) -> Result<String> {
        let url = self.url(path)?;
        let mut request: RequestBuilder = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        // Outbound hook
        let (request, sent) = attach_credentials(request, &self.credentials).await?;

        let response = request.send().await.map_err(|e| {
            let err = AppError::from(e);
            tracing::warn!(%method, path, error = %err, "Request failed before a response");
            err
        })?;

        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "Response received");

        if status.is_success() {
            return response.text().await.map_err(AppError::from);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(%method, path, error = %e, "Failed to read error response body");
                String::new()
            }
        };

        // Inbound hook. The sink runs before the caller sees the error.
        if kind == CallKind::Session {
            self.unauthorized.inspect(status, sent.as_ref()).await;
        }

        Err(AppError::from_status(
            status,
            &text,
            kind == CallKind::CredentialExchange,
        ))
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(path, error = %e, "Undecodable response body");
        AppError::InvalidResponse(format!("{path}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_under_base() {
        let config = Config::for_base("http://127.0.0.1:8080/api").unwrap();
        let transport = ApiTransport::new(&config, CredentialStore::in_memory()).unwrap();

        assert_eq!(
            transport.url("/auth/login").unwrap().as_str(),
            "http://127.0.0.1:8080/api/auth/login"
        );
        assert_eq!(
            transport.url("me/profile").unwrap().as_str(),
            "http://127.0.0.1:8080/api/me/profile"
        );
    }

    #[tokio::test]
    async fn test_truncated_error_body_still_maps_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promises more body than it sends, then hangs up.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 64\r\n\r\n{\"err")
                .await
                .unwrap();
        });

        let config = Config::for_base(&format!("http://{addr}/api")).unwrap();
        let transport = ApiTransport::new(&config, CredentialStore::in_memory()).unwrap();

        let err = transport
            .get_json::<serde_json::Value>("me/profile")
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Not Found".to_string()));
    }

    #[test]
    fn test_decode_errors_are_invalid_response() {
        let result: Result<crate::models::TokenResponse> = decode("auth/login", "{}");
        assert!(matches!(result, Err(AppError::InvalidResponse(_))));
    }
}
