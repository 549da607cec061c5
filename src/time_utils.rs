// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for unix-clock timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as unix-epoch seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Format unix-epoch seconds as RFC3339 with a `Z` suffix, for logs.
pub fn format_unix_rfc3339(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| secs.to_string())
}
