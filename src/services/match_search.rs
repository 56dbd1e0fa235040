// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match Search Workflow.
//!
//! Resolves a search center once per workflow, turns raw user input into
//! a validated `FindRequest`, and keeps the latest applied result. A
//! response that arrives after teardown, after a session change, or after
//! a newer search has already been applied is discarded.

use crate::error::{AppError, Result};
use crate::models::matching::MAX_RADIUS_KM;
use crate::models::{Coordinates, FindRequest, FindResponse, MatchFormat};
use crate::services::api::TennisApi;
use crate::services::location::LocationProvider;
use crate::services::session::SessionController;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

/// Radius used when the field is left empty.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Upper bound on waiting for the device position.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Raw search form input.
#[derive(Debug, Clone)]
pub struct SearchInput {
    /// Radius as typed by the user
    pub radius_km: String,
    pub format: MatchFormat,
    /// Defaults to now
    pub window_start: Option<DateTime<Utc>>,
}

impl SearchInput {
    pub fn new(radius_km: impl Into<String>, format: MatchFormat) -> Self {
        Self {
            radius_km: radius_km.into(),
            format,
            window_start: None,
        }
    }

    pub fn starting_at(mut self, window_start: DateTime<Utc>) -> Self {
        self.window_start = Some(window_start);
        self
    }
}

/// What happened to a completed search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The response is now the displayed result.
    Applied(Arc<FindResponse>),
    /// The response arrived too late to be shown.
    Discarded,
}

struct Snapshot {
    ticket: u64,
    epoch: u64,
    response: Arc<FindResponse>,
}

/// One match search screen's worth of state.
pub struct MatchSearch {
    api: TennisApi,
    session: Arc<SessionController>,
    location: Arc<dyn LocationProvider>,
    center: Mutex<Option<Coordinates>>,
    /// Only one location prompt at a time.
    locating: tokio::sync::Mutex<()>,
    snapshot: RwLock<Option<Snapshot>>,
    next_ticket: AtomicU64,
    closed: AtomicBool,
}

impl MatchSearch {
    pub fn new(
        api: TennisApi,
        session: Arc<SessionController>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            api,
            session,
            location,
            center: Mutex::new(None),
            locating: tokio::sync::Mutex::new(()),
            snapshot: RwLock::new(None),
            next_ticket: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Currently established center, if any.
    pub fn center(&self) -> Option<Coordinates> {
        *self.center.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Use `center` for subsequent searches instead of the device position.
    pub fn set_center(&self, center: Coordinates) {
        *self.center.lock().unwrap_or_else(PoisonError::into_inner) = Some(center);
    }

    /// Forget the center so the next search asks for the device position.
    pub fn clear_center(&self) {
        *self.center.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The established center, acquiring the device position the first time.
    pub async fn resolve_center(&self) -> Result<Coordinates> {
        if let Some(center) = self.center() {
            return Ok(center);
        }

        let _guard = self.locating.lock().await;
        if let Some(center) = self.center() {
            return Ok(center);
        }

        let position = tokio::time::timeout(LOCATION_TIMEOUT, self.location.current_position())
            .await
            .map_err(|_| {
                tracing::warn!("Timed out waiting for device position");
                AppError::Timeout
            })??;

        tracing::debug!(center = %position, "Search center acquired from device");
        self.set_center(position);
        Ok(position)
    }

    /// Run one search from raw form input.
    ///
    /// Input errors surface before the location prompt or any network
    /// call. Errors are always returned to the caller, even for a search
    /// whose result would have been discarded.
    pub async fn search(&self, input: SearchInput) -> Result<SearchOutcome> {
        let radius_km = parse_radius(&input.radius_km)?;

        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = self.session.epoch();

        let center = self.resolve_center().await?;
        let request = FindRequest::new(
            center,
            radius_km,
            input.format,
            input.window_start.unwrap_or_else(Utc::now),
        );

        let response = self.api.find_matches(&request).await?;
        Ok(self.apply(ticket, epoch, response))
    }

    fn apply(&self, ticket: u64, epoch: u64, response: FindResponse) -> SearchOutcome {
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!(ticket, "Discarding search result for closed workflow");
            return SearchOutcome::Discarded;
        }
        if !self.session.is_current(epoch) {
            tracing::debug!(ticket, epoch, "Discarding search result from ended session");
            return SearchOutcome::Discarded;
        }

        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = snapshot.as_ref() {
            if current.epoch == epoch && current.ticket > ticket {
                tracing::debug!(ticket, newer = current.ticket, "Discarding superseded search result");
                return SearchOutcome::Discarded;
            }
        }

        let response = Arc::new(response);
        *snapshot = Some(Snapshot {
            ticket,
            epoch,
            response: response.clone(),
        });
        tracing::info!(
            ticket,
            candidates = response.candidates.len(),
            suggestions = response.suggestions.len(),
            "Search result applied"
        );
        SearchOutcome::Applied(response)
    }

    /// The displayed result, if it belongs to the current session.
    pub fn results(&self) -> Option<Arc<FindResponse>> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        snapshot
            .as_ref()
            .filter(|s| self.session.is_current(s.epoch))
            .map(|s| s.response.clone())
    }

    /// Mark the workflow as gone. In-flight searches still complete but
    /// their results are dropped.
    pub fn teardown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Parse the radius field. Empty means the default; anything that is not
/// a positive number within the backend's limit is rejected.
pub fn parse_radius(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_RADIUS_KM);
    }

    let radius: f64 = raw
        .parse()
        .map_err(|_| AppError::Validation(format!("radius must be a number, got {raw:?}")))?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(AppError::Validation(format!(
            "radius must be a positive number, got {raw:?}"
        )));
    }
    if radius > MAX_RADIUS_KM {
        return Err(AppError::Validation(format!(
            "radius must be at most {MAX_RADIUS_KM} km"
        )));
    }
    Ok(radius)
}
