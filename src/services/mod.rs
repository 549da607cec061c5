// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod pagination;
pub mod session;
pub mod strava;

pub use pagination::ActivityFetcher;
pub use session::SessionStore;
pub use strava::{StravaClient, StravaError, StravaService};
