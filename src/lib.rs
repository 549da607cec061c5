// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Data: download your Strava activities.
//!
//! This crate provides a small web backend that signs a user in with
//! Strava OAuth, keeps the access token fresh, and pages through the
//! athlete's activity listing on their behalf.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use services::{SessionStore, StravaService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaService,
    pub sessions: SessionStore,
}

impl AppState {
    /// Build state from configuration with an empty session store.
    pub fn new(config: Config) -> Result<Self, error::AppError> {
        let strava = StravaService::new(&config)?;
        Ok(Self {
            config,
            strava,
            sessions: SessionStore::default(),
        })
    }
}
