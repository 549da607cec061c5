// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token triple held on behalf of one user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh token pair plus the upstream-reported access token expiry.
///
/// Produced by token exchange or refresh and owned by a single request (or a
/// session record). Never persisted beyond process memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which `access_token` expires
    pub expires_at: i64,
}

impl TokenSet {
    /// True when the access token is inside the refresh margin (or already
    /// expired): `expires_at - margin_secs <= now`.
    pub fn needs_refresh(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at.saturating_sub(margin_secs) <= now
    }

    /// Seconds until expiry, negative once expired.
    pub fn expires_in(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

// Token material must never end up in logs.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
