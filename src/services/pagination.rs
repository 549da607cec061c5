// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated activity fetch.
//!
//! Walks `/athlete/activities` one page at a time until a page comes back
//! empty. Pages are requested strictly in sequence and concatenated in the
//! order Strava returns them. Any failure discards what was collected so far.

use crate::config::PaginationConfig;
use crate::error::AppError;
use crate::models::FetchCursor;
use crate::services::strava::{StravaClient, StravaError};
use std::time::Duration;

/// Fetches every page of an activity listing under a `PaginationConfig`.
pub struct ActivityFetcher<'a> {
    client: &'a StravaClient,
    policy: &'a PaginationConfig,
}

impl<'a> ActivityFetcher<'a> {
    pub fn new(client: &'a StravaClient, policy: &'a PaginationConfig) -> Self {
        Self { client, policy }
    }

    /// Fetch all activities strictly after `after` (unix seconds).
    pub async fn fetch_all(
        &self,
        access_token: &str,
        after: i64,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let mut cursor = FetchCursor::new(after);
        let mut activities = Vec::new();

        loop {
            if cursor.page > self.policy.max_pages {
                tracing::error!(
                    max_pages = self.policy.max_pages,
                    fetched = activities.len(),
                    "Activity fetch exceeded page limit"
                );
                return Err(AppError::UpstreamFetch(format!(
                    "Page limit of {} reached before end of data",
                    self.policy.max_pages
                )));
            }

            let page = self
                .fetch_page_with_retry(access_token, &cursor)
                .await
                .map_err(|e| {
                    tracing::error!(page = cursor.page, error = %e, "Activity page fetch failed");
                    AppError::UpstreamFetch(format!("Page {} failed: {}", cursor.page, e))
                })?;

            if page.is_empty() {
                break;
            }

            tracing::debug!(page = cursor.page, count = page.len(), "Fetched activity page");
            activities.extend(page);
            cursor.advance();
        }

        tracing::info!(
            pages = cursor.page - 1,
            count = activities.len(),
            after,
            "Activity fetch complete"
        );

        Ok(activities)
    }

    /// Fetch one page, retrying transient failures with exponential backoff.
    async fn fetch_page_with_retry(
        &self,
        access_token: &str,
        cursor: &FetchCursor,
    ) -> Result<Vec<serde_json::Value>, StravaError> {
        let mut attempt = 0;

        loop {
            match self
                .client
                .list_activities(access_token, cursor, self.policy.per_page)
                .await
            {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = backoff_delay(self.policy, attempt);
                    tracing::warn!(
                        page = cursor.page,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient Strava failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before retry number `attempt + 1`: doubles from the initial backoff,
/// capped at `max_backoff`.
fn backoff_delay(policy: &PaginationConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    policy
        .initial_backoff
        .saturating_mul(factor)
        .min(policy.max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = PaginationConfig {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
            ..PaginationConfig::default()
        };

        assert_eq!(backoff_delay(&policy, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&policy, 3), Duration::from_secs(3));
        assert_eq!(backoff_delay(&policy, 40), Duration::from_secs(3));
    }
}
