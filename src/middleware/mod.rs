// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request pipeline hooks (credential injection, unauthorized detection).

pub mod auth;
pub mod unauthorized;

pub use auth::attach_credentials;
pub use unauthorized::{UnauthorizedHandler, UnauthorizedSignal};
