// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Nonce registry (C5): global replay protection keyed by nonce alone.
//!
//! Entries are kept until their envelope's `expires_at` has passed *and* a
//! garbage collection pass has run - a nonce is conservatively considered
//! "still seen" even after it has logically expired, until GC catches up.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Default interval between opportunistic GC passes.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 300;

/// Nonce registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonceRegistryError {
    /// The nonce has already been recorded.
    #[error("duplicate nonce")]
    Duplicate,
}

struct Entry {
    expires_at: DateTime<Utc>,
}

/// In-memory replay-protection registry, keyed by `nonce` alone: a nonce
/// is global, not scoped to the sender that first used it.
pub struct NonceRegistry {
    cleanup_interval: chrono::Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    seen: HashMap<String, Entry>,
    last_cleanup: Option<DateTime<Utc>>,
}

impl NonceRegistry {
    /// A registry with the default cleanup interval.
    pub fn new() -> Self {
        Self::with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL_SECS)
    }

    /// A registry that runs opportunistic GC at most once per
    /// `cleanup_interval_secs` seconds.
    pub fn with_cleanup_interval(cleanup_interval_secs: i64) -> Self {
        Self {
            cleanup_interval: chrono::Duration::seconds(cleanup_interval_secs),
            inner: Mutex::new(Inner { seen: HashMap::new(), last_cleanup: None }),
        }
    }

    /// True if `nonce` has already been recorded and has not yet been
    /// garbage collected.
    pub fn has_seen(&self, nonce: &str, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        self.maybe_cleanup(&mut inner, now);
        inner.seen.contains_key(nonce)
    }

    /// Record `nonce` as seen, rejecting a duplicate.
    ///
    /// `expires_at` is the envelope's own expiry: once GC runs after that
    /// point the entry may be dropped, re-opening the window for reuse of
    /// an already-expired nonce. This is intentional - an expired envelope
    /// cannot be admitted regardless, so replay-guarding it forever is
    /// unnecessary.
    pub fn add(&self, nonce: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), NonceRegistryError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        self.maybe_cleanup(&mut inner, now);
        if inner.seen.contains_key(nonce) {
            return Err(NonceRegistryError::Duplicate);
        }
        inner.seen.insert(nonce.to_string(), Entry { expires_at });
        Ok(())
    }

    /// Number of entries currently tracked (including not-yet-GC'd expired
    /// ones).
    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").seen.len()
    }

    /// True if no entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose envelope has expired, unconditionally (ignores
    /// the cleanup interval throttle).
    pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock().expect("lock poisoned");
        self.cleanup_now(&mut inner, now)
    }

    fn maybe_cleanup(&self, inner: &mut Inner, now: DateTime<Utc>) {
        let due = match inner.last_cleanup {
            None => true,
            Some(last) => now - last >= self.cleanup_interval,
        };
        if due {
            self.cleanup_now(inner, now);
        }
    }

    fn cleanup_now(&self, inner: &mut Inner, now: DateTime<Utc>) -> usize {
        let before = inner.seen.len();
        inner.seen.retain(|_, entry| entry.expires_at > now);
        inner.last_cleanup = Some(now);
        before - inner.seen.len()
    }
}

impl Default for NonceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_nonce_is_not_seen() {
        let reg = NonceRegistry::new();
        assert!(!reg.has_seen("nonce", Utc::now()));
    }

    #[test]
    fn add_then_add_again_is_duplicate() {
        let reg = NonceRegistry::new();
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        reg.add("nonce", expires, now).unwrap();
        assert_eq!(reg.add("nonce", expires, now), Err(NonceRegistryError::Duplicate));
    }

    #[test]
    fn different_senders_reusing_the_same_nonce_is_rejected() {
        // The registry is global: a nonce is a one-time token regardless of
        // which sender presents it first.
        let reg = NonceRegistry::new();
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        reg.add("nonce", expires, now).unwrap();
        assert_eq!(reg.add("nonce", expires, now), Err(NonceRegistryError::Duplicate));
    }

    #[test]
    fn cleanup_expired_drops_only_past_expiry() {
        let reg = NonceRegistry::new();
        let now = Utc::now();
        reg.add("expired", now - Duration::minutes(1), now).unwrap();
        reg.add("fresh", now + Duration::minutes(10), now).unwrap();
        let dropped = reg.cleanup_expired(now);
        assert_eq!(dropped, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn expired_entry_still_seen_until_gc_runs() {
        let reg = NonceRegistry::with_cleanup_interval(i64::MAX / 2);
        let now = Utc::now();
        reg.add("nonce", now - Duration::minutes(1), now).unwrap();
        assert!(reg.has_seen("nonce", now));
    }
}
