// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Match search request/response contracts.

use super::{null_as_default, Coordinates, MatchFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Largest search radius the backend accepts.
pub const MAX_RADIUS_KM: f64 = 100.0;

/// Result bound used when the caller does not pick one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest result bound the backend honors.
pub const MAX_LIMIT: u32 = 100;

/// A single search, constructed fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_find_request"))]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct FindRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub center_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub center_lng: f64,
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub radius_km: f64,
    pub format: MatchFormat,
    #[serde(with = "crate::time_utils::rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub window_start: DateTime<Utc>,
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

impl FindRequest {
    pub fn new(
        center: Coordinates,
        radius_km: f64,
        format: MatchFormat,
        window_start: DateTime<Utc>,
    ) -> Self {
        Self {
            center_lat: center.lat(),
            center_lng: center.lng(),
            radius_km,
            format,
            window_start,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn center(&self) -> Option<Coordinates> {
        Coordinates::new(self.center_lat, self.center_lng).ok()
    }
}

fn validate_find_request(req: &FindRequest) -> Result<(), ValidationError> {
    if !(req.center_lat.is_finite() && req.center_lng.is_finite() && req.radius_km.is_finite()) {
        return Err(ValidationError::new("non_finite_number"));
    }
    Ok(())
}

/// A candidate opponent, ranked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Candidate {
    pub user_id: i64,
    pub elo: i32,
    /// Distance from the search center
    pub meters: f64,
    pub score: f64,
}

impl Candidate {
    pub fn kilometers(&self) -> f64 {
        self.meters / 1000.0
    }
}

/// A suggested court and time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Suggestion {
    pub court_id: i64,
    #[serde(with = "crate::time_utils::rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_at: DateTime<Utc>,
    #[serde(with = "crate::time_utils::rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_at: DateTime<Utc>,
    pub message: String,
}

impl Suggestion {
    pub fn duration(&self) -> chrono::Duration {
        self.end_at - self.start_at
    }
}

/// Search result snapshot. Order is exactly as the backend sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct FindResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<Suggestion>,
}

impl FindResponse {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> FindRequest {
        FindRequest::new(
            Coordinates::new(31.23, 121.47).unwrap(),
            10.0,
            MatchFormat::Singles,
            Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_request_wire_shape() {
        let body = serde_json::to_value(request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "centerLat": 31.23,
                "centerLng": 121.47,
                "radiusKm": 10.0,
                "format": "SINGLES",
                "windowStart": "2026-05-01T18:00:00Z",
                "limit": 50
            })
        );
    }

    #[test]
    fn test_request_bounds() {
        assert!(request().validate().is_ok());

        let mut zero_radius = request();
        zero_radius.radius_km = 0.0;
        assert!(zero_radius.validate().is_err());

        let mut wide = request();
        wide.radius_km = 100.5;
        assert!(wide.validate().is_err());

        assert!(request().with_limit(0).validate().is_err());
        assert!(request().with_limit(101).validate().is_err());

        let mut nan = request();
        nan.radius_km = f64::NAN;
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_null_lists_normalize_to_empty() {
        let resp: FindResponse =
            serde_json::from_str(r#"{"candidates":null,"suggestions":null}"#).unwrap();
        assert!(resp.is_empty());

        let resp: FindResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn test_response_order_preserved() {
        let resp: FindResponse = serde_json::from_str(
            r#"{
              "candidates":[
                {"userId":7,"elo":1300,"meters":4200.0,"score":-2.1},
                {"userId":3,"elo":1210,"meters":800.0,"score":-0.4}
              ],
              "suggestions":[
                {"courtId":1,"startAt":"2026-05-01T20:00:00Z","endAt":"2026-05-01T21:00:00Z","message":"Thursday 7-8pm?"}
              ]
            }"#,
        )
        .unwrap();
        let ids: Vec<i64> = resp.candidates.iter().map(|c| c.user_id).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(resp.candidates[0].kilometers(), 4.2);
        assert_eq!(resp.suggestions[0].duration(), chrono::Duration::hours(1));
    }
}
