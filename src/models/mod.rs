// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wire models shared with the matching backend.

pub mod auth;
pub mod geo;
pub mod matching;
pub mod profile;

pub use auth::{Credentials, IdentityTokenLogin, SessionToken, TokenResponse};
pub use geo::Coordinates;
pub use matching::{Candidate, FindRequest, FindResponse, Suggestion};
pub use profile::{Handedness, MatchFormat, Profile};

use serde::{Deserialize, Deserializer};

/// Read an explicit JSON `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
