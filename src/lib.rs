// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tennis Match: session and API client for a tennis-partner-matching service
//!
//! This crate persists the session credential, attaches it to every
//! backend call, tears the session down when the backend rejects it, and
//! runs match searches against the backend's ranking.

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;

pub use client::TennisClient;
pub use config::Config;
pub use error::{AppError, Result};
