// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory session store.
//!
//! Maps opaque, randomly generated session IDs to the token record they
//! stand for, so bearer tokens never travel through URLs or browser storage.

use crate::error::AppError;
use crate::models::{Athlete, SessionRecord, TokenSet};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Session lifetime (7 days).
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Random bytes per session ID (hex-encoded to 64 chars).
const SESSION_ID_BYTES: usize = 32;

/// Shared session map, cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionRecord>>,
    rng: SystemRandom,
    ttl_secs: i64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL_SECS)
    }
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Store a new session and return its ID.
    pub fn create(&self, tokens: TokenSet, athlete: Athlete, now: i64) -> Result<String, AppError> {
        self.purge_expired(now);

        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Session ID generation failed")))?;
        let session_id = hex::encode(bytes);

        self.sessions.insert(
            session_id.clone(),
            SessionRecord {
                tokens,
                athlete,
                created_at: now,
            },
        );

        tracing::debug!(active = self.sessions.len(), "Session created");
        Ok(session_id)
    }

    /// Look up a live session. Expired entries are dropped on access.
    pub fn get(&self, session_id: &str, now: i64) -> Option<SessionRecord> {
        let record = self.sessions.get(session_id)?.value().clone();
        if self.is_expired(&record, now) {
            self.sessions.remove(session_id);
            return None;
        }
        Some(record)
    }

    /// Replace the token set of an existing session. Returns false if the
    /// session is gone.
    pub fn update_tokens(&self, session_id: &str, tokens: TokenSet) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(mut record) => {
                record.tokens = tokens;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.remove(session_id).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn purge_expired(&self, now: i64) {
        self.sessions
            .retain(|_, record| now < record.created_at + self.ttl_secs);
    }

    fn is_expired(&self, record: &SessionRecord, now: i64) -> bool {
        now >= record.created_at + self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(tag: &str) -> TokenSet {
        TokenSet {
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
            expires_at: 2_000_000_000,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::default();
        let id = store.create(tokens("a"), Athlete::default(), 1000).unwrap();

        assert_eq!(id.len(), SESSION_ID_BYTES * 2);
        let record = store.get(&id, 1001).expect("session should exist");
        assert_eq!(record.tokens, tokens("a"));
        assert_eq!(record.created_at, 1000);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = SessionStore::default();
        let a = store.create(tokens("a"), Athlete::default(), 0).unwrap();
        let b = store.create(tokens("b"), Athlete::default(), 0).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_tokens() {
        let store = SessionStore::default();
        let id = store.create(tokens("a"), Athlete::default(), 0).unwrap();

        assert!(store.update_tokens(&id, tokens("b")));
        assert_eq!(store.get(&id, 1).unwrap().tokens, tokens("b"));
        assert!(!store.update_tokens("missing", tokens("c")));
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(100);
        let old = store.create(tokens("a"), Athlete::default(), 0).unwrap();

        assert!(store.get(&old, 99).is_some());
        assert!(store.get(&old, 100).is_none());
        assert!(store.is_empty());

        let stale = store.create(tokens("b"), Athlete::default(), 0).unwrap();
        let fresh = store.create(tokens("c"), Athlete::default(), 150).unwrap();
        assert!(store.get(&stale, 150).is_none());
        assert!(store.get(&fresh, 150).is_some());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::default();
        let id = store.create(tokens("a"), Athlete::default(), 0).unwrap();
        assert!(store.remove(&id).is_some());
        assert!(store.get(&id, 0).is_none());
    }
}
