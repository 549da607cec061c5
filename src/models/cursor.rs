// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pagination state for the activity listing.

/// Position in a time-bounded, multi-page activity listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCursor {
    /// 1-indexed page number
    pub page: u32,
    /// Only activities strictly after this unix timestamp are listed
    pub after_timestamp: i64,
}

impl FetchCursor {
    pub fn new(after_timestamp: i64) -> Self {
        Self {
            page: 1,
            after_timestamp,
        }
    }

    /// Move to the next page after a non-empty page was consumed.
    pub fn advance(&mut self) {
        self.page += 1;
    }
}
