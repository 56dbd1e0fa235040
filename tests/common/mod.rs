// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fake matching backend for integration tests.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tennis_match_client::services::{FixedLocation, LocationProvider};
use tennis_match_client::store::CredentialStore;
use tennis_match_client::{Config, TennisClient};

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// ID token the fake identity provider accepts.
#[allow(dead_code)]
pub const VALID_ID_TOKEN: &str = "valid-google-id-token";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    /// email -> (user id, password)
    users: Mutex<HashMap<String, (i64, String)>>,
    profiles: Mutex<HashMap<i64, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    find_bodies: Mutex<Vec<Value>>,
    find_response: Mutex<Option<Value>>,
    delay: Mutex<Duration>,
    /// Pause between reading a profile and answering.
    profile_read_delay: Mutex<Duration>,
    next_user_id: AtomicI64,
    /// Reject every session token with 401.
    sessions_expired: AtomicBool,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, error: &str) -> ApiError {
    (status, Json(json!({ "error": error })))
}

fn mint_token(user_id: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 86400,
        iat: now,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("Failed to create JWT")
}

impl BackendState {
    fn authenticate(&self, headers: &HeaderMap) -> Result<i64, ApiError> {
        let unauthorized = || api_error(StatusCode::UNAUTHORIZED, "unauthorized");
        if self.sessions_expired.load(Ordering::SeqCst) {
            return Err(unauthorized());
        }
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(SIGNING_KEY),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| unauthorized())?;
        data.claims.sub.parse().map_err(|_| unauthorized())
    }

    fn create_user(&self, email: &str, password: &str) -> Option<i64> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return None;
        }
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        users.insert(email.to_string(), (id, password.to_string()));
        Some(id)
    }
}

#[derive(Deserialize)]
struct CredentialsBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenBody {
    #[serde(default)]
    id_token: String,
}

async fn register(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "email and password required",
        ));
    }
    let id = state
        .create_user(&email, &body.password)
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "email already registered"))?;
    Ok(Json(json!({ "token": mint_token(id) })))
}

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let email = body.email.trim().to_lowercase();
    let users = state.users.lock().unwrap();
    match users.get(&email) {
        Some((id, password)) if *password == body.password => {
            Ok(Json(json!({ "token": mint_token(*id) })))
        }
        _ => Err(api_error(StatusCode::UNAUTHORIZED, "invalid credentials")),
    }
}

async fn login_google(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<IdTokenBody>,
) -> Result<Json<Value>, ApiError> {
    if body.id_token != VALID_ID_TOKEN {
        return Err(api_error(StatusCode::UNAUTHORIZED, "invalid id token"));
    }
    let email = "google-user@example.com";
    let id = match state.create_user(email, "") {
        Some(id) => id,
        None => state.users.lock().unwrap()[email].0,
    };
    Ok(Json(json!({ "token": mint_token(id) })))
}

async fn get_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = state.authenticate(&headers)?;
    let mut profile = state
        .profiles
        .lock()
        .unwrap()
        .get(&user_id)
        .cloned()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "profile not found"))?;
    profile["elo"] = json!(1200);

    let delay = *state.profile_read_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(profile))
}

async fn put_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user_id = state.authenticate(&headers)?;
    state.profiles.lock().unwrap().insert(user_id, body);
    Ok(Json(json!({ "ok": true })))
}

async fn find(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.authenticate(&headers)?;
    state.find_bodies.lock().unwrap().push(body);
    let response = state
        .find_response
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| json!({ "candidates": [], "suggestions": [] }));
    Ok(Json(response))
}

/// Record every request and apply the configured delay.
async fn record(State(state): State<Arc<BackendState>>, req: Request, next: Next) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        authorization: req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    next.run(req).await.into_response()
}

/// A running fake backend.
pub struct FakeBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let api = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/login/google", post(login_google))
            .route("/me/profile", get(get_profile).put(put_profile))
            .route("/match/find", post(find));

        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config::for_base(&self.base_url).expect("valid base URL")
    }

    /// Client on an in-memory store with no device position.
    pub fn client(&self) -> TennisClient {
        TennisClient::new(self.config(), CredentialStore::in_memory()).unwrap()
    }

    pub fn client_with_store(&self, store: CredentialStore) -> TennisClient {
        TennisClient::new(self.config(), store).unwrap()
    }

    pub fn client_at(&self, location: FixedLocation) -> TennisClient {
        let location: Arc<dyn LocationProvider> = Arc::new(location);
        TennisClient::with_location(self.config(), CredentialStore::in_memory(), location).unwrap()
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.state.create_user(email, password);
    }

    pub fn set_find_response(&self, response: Value) {
        *self.state.find_response.lock().unwrap() = Some(response);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn set_profile_read_delay(&self, delay: Duration) {
        *self.state.profile_read_delay.lock().unwrap() = delay;
    }

    /// Make every session token invalid from now on.
    pub fn expire_sessions(&self) {
        self.state.sessions_expired.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests to `path` (relative to `/api`).
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        let full = format!("/api{path}");
        self.requests()
            .into_iter()
            .filter(|r| r.path == full)
            .collect()
    }

    pub fn find_bodies(&self) -> Vec<Value> {
        self.state.find_bodies.lock().unwrap().clone()
    }
}
