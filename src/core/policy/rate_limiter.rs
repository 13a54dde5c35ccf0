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

//! Per-sender rate limiter (C6): sliding 1h/24h acceptance windows.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Rate limit violation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RateLimitError(pub String);

/// Tracks accepted-envelope timestamps per sender and enforces hourly and
/// daily caps. `None` caps are unlimited.
pub struct RateLimiter {
    per_sender: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    /// A fresh limiter with no recorded acceptances.
    pub fn new() -> Self {
        Self { per_sender: Mutex::new(HashMap::new()) }
    }

    /// Check `sender`'s current rate against `max_per_hour`/`max_per_day`
    /// and, if within caps, record `now` as a new acceptance.
    ///
    /// Checking and recording happen under a single per-call lock
    /// acquisition, so concurrent callers for the same sender cannot both
    /// observe capacity and both record.
    pub fn check_and_record(
        &self,
        sender_hex: &str,
        max_per_hour: Option<u64>,
        max_per_day: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<(), RateLimitError> {
        let mut per_sender = self.per_sender.lock().expect("lock poisoned");
        let history = per_sender.entry(sender_hex.to_string()).or_default();

        let day_cutoff = now - Duration::hours(24);
        while history.front().is_some_and(|t| *t < day_cutoff) {
            history.pop_front();
        }

        let hour_cutoff = now - Duration::hours(1);
        let hourly_count = history.iter().filter(|t| **t >= hour_cutoff).count() as u64;
        let daily_count = history.len() as u64;

        if let Some(max) = max_per_hour {
            if hourly_count >= max {
                return Err(RateLimitError(format!(
                    "Hourly rate limit exceeded ({hourly_count}/{max})"
                )));
            }
        }
        if let Some(max) = max_per_day {
            if daily_count >= max {
                return Err(RateLimitError(format!(
                    "Daily rate limit exceeded ({daily_count}/{max})"
                )));
            }
        }

        history.push_back(now);
        Ok(())
    }

    /// Number of senders with at least one recorded acceptance still inside
    /// the 24h window.
    pub fn tracked_senders(&self) -> usize {
        self.per_sender.lock().expect("lock poisoned").len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_caps_never_reject() {
        let rl = RateLimiter::new();
        let now = Utc::now();
        for _ in 0..50 {
            assert!(rl.check_and_record("sender", None, None, now).is_ok());
        }
    }

    #[test]
    fn hourly_cap_is_enforced_with_exact_message() {
        let rl = RateLimiter::new();
        let now = Utc::now();
        rl.check_and_record("sender", Some(1), None, now).unwrap();
        let err = rl.check_and_record("sender", Some(1), None, now).unwrap_err();
        assert_eq!(err.0, "Hourly rate limit exceeded (1/1)");
    }

    #[test]
    fn daily_cap_is_enforced_with_exact_message() {
        let rl = RateLimiter::new();
        let now = Utc::now();
        rl.check_and_record("sender", None, Some(1), now).unwrap();
        let err = rl.check_and_record("sender", None, Some(1), now).unwrap_err();
        assert_eq!(err.0, "Daily rate limit exceeded (1/1)");
    }

    #[test]
    fn old_entries_fall_out_of_the_daily_window() {
        let rl = RateLimiter::new();
        let now = Utc::now();
        rl.check_and_record("sender", None, Some(1), now - Duration::hours(25)).unwrap();
        assert!(rl.check_and_record("sender", None, Some(1), now).is_ok());
    }

    #[test]
    fn senders_are_independent() {
        let rl = RateLimiter::new();
        let now = Utc::now();
        rl.check_and_record("a", Some(1), None, now).unwrap();
        assert!(rl.check_and_record("b", Some(1), None, now).is_ok());
    }
}
