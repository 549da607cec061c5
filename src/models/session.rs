// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session record for the cookie-backed flow.

use super::{Athlete, TokenSet};

/// Token material and profile held server-side for one browser session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub tokens: TokenSet,
    pub athlete: Athlete,
    /// Unix timestamp the session was created
    pub created_at: i64,
}
