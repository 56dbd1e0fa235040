// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Matching profile model, owned by the backend and cached per session.

use super::{null_as_default, Coordinates};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Playing hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub enum Handedness {
    #[default]
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "L")]
    Left,
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" => Ok(Handedness::Right),
            "L" => Ok(Handedness::Left),
            other => Err(format!("handedness must be R or L, got {other:?}")),
        }
    }
}

/// Match format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub enum MatchFormat {
    Singles,
    Doubles,
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchFormat::Singles => f.write_str("SINGLES"),
            MatchFormat::Doubles => f.write_str("DOUBLES"),
        }
    }
}

impl FromStr for MatchFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SINGLES" => Ok(MatchFormat::Singles),
            "DOUBLES" => Ok(MatchFormat::Doubles),
            other => Err(format!("format must be SINGLES or DOUBLES, got {other:?}")),
        }
    }
}

/// The user's matching profile.
///
/// Writes are full replacements: the client always sends the complete
/// desired state. `elo` is computed by the backend and never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_profile"))]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct Profile {
    #[serde(default)]
    pub handedness: Handedness,
    pub level_est: f64,
    #[serde(default, skip_serializing)]
    pub elo: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<MatchFormat>"))]
    pub preferred_formats: BTreeSet<MatchFormat>,
    pub radius_km: u32,
    #[serde(default)]
    pub home_lat: Option<f64>,
    #[serde(default)]
    pub home_lng: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    pub availability: Map<String, Value>,
}

impl Profile {
    /// A profile with the given essentials and no home location.
    pub fn new(
        handedness: Handedness,
        level_est: f64,
        preferred_formats: impl IntoIterator<Item = MatchFormat>,
        radius_km: u32,
    ) -> Self {
        Self {
            handedness,
            level_est,
            elo: 0,
            preferred_formats: preferred_formats.into_iter().collect(),
            radius_km,
            home_lat: None,
            home_lng: None,
            availability: Map::new(),
        }
    }

    /// Home location, present only when both halves are set.
    pub fn home(&self) -> Option<Coordinates> {
        match (self.home_lat, self.home_lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
            _ => None,
        }
    }

    /// Set or clear both halves of the home location together.
    pub fn set_home(&mut self, home: Option<Coordinates>) {
        self.home_lat = home.map(|c| c.lat());
        self.home_lng = home.map(|c| c.lng());
    }

    pub fn with_home(mut self, home: Coordinates) -> Self {
        self.set_home(Some(home));
        self
    }
}

fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    if !profile.level_est.is_finite() || profile.level_est < 0.0 {
        return Err(ValidationError::new("level_est_negative"));
    }
    if profile.preferred_formats.is_empty() {
        return Err(ValidationError::new("preferred_formats_empty"));
    }
    match (profile.home_lat, profile.home_lng) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
            .map(|_| ())
            .map_err(|_| ValidationError::new("home_out_of_range")),
        _ => Err(ValidationError::new("home_lat_lng_must_pair")),
    }
}
