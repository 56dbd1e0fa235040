// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - client logic layer.

pub mod api;
pub mod cache;
pub mod http;
pub mod location;
pub mod match_search;
pub mod session;

pub use api::TennisApi;
pub use cache::{CacheCoordinator, CacheKey};
pub use http::{ApiTransport, CallKind};
pub use location::{FixedLocation, LocationProvider};
pub use match_search::{MatchSearch, SearchInput, SearchOutcome};
pub use session::{SessionController, SessionStatus, SignOutReason};
