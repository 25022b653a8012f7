// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user sliding-window request quota.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tollgate_config::model::RateLimitConfig;
use tollgate_core::TollgateError;

/// Sliding-window limiter keyed by user id.
///
/// Each user's timestamps live behind the map's entry lock, so the
/// prune-check-append sequence is atomic per user while different users
/// never contend.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    usage: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            usage: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Charge one request to `user_id` and return the quota left afterwards.
    pub fn check_and_record(&self, user_id: &str) -> Result<usize, TollgateError> {
        self.check_and_record_at(user_id, Instant::now())
    }

    /// Charge one request as if the current time were `now`.
    ///
    /// A refused request is not recorded.
    pub fn check_and_record_at(&self, user_id: &str, now: Instant) -> Result<usize, TollgateError> {
        let mut entry = self.usage.entry(user_id.to_string()).or_default();
        prune(&mut entry, now, self.window);

        if entry.len() >= self.max_requests {
            tracing::debug!(user_id, used = entry.len(), "rate limit reached");
            return Err(TollgateError::RateLimitExceeded {
                user_id: user_id.to_string(),
                limit: self.max_requests,
                window: self.window,
            });
        }

        entry.push_back(now);
        Ok(self.max_requests - entry.len())
    }

    /// Quota left for `user_id` without charging anything.
    pub fn remaining(&self, user_id: &str) -> usize {
        self.remaining_at(user_id, Instant::now())
    }

    pub fn remaining_at(&self, user_id: &str, now: Instant) -> usize {
        match self.usage.get_mut(user_id) {
            Some(mut entry) => {
                prune(&mut entry, now, self.window);
                self.max_requests.saturating_sub(entry.len())
            }
            None => self.max_requests,
        }
    }

    /// Number of users with a usage window on record.
    pub fn tracked_users(&self) -> usize {
        self.usage.len()
    }
}

/// Drop entries that are not strictly younger than the window.
fn prune(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = entries.front() {
        if now.saturating_duration_since(oldest) >= window {
            entries.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn admits_up_to_limit_then_refuses() {
        let limiter = RateLimiter::new(10, WINDOW);
        let t0 = Instant::now();
        for i in 0..10 {
            let remaining = limiter
                .check_and_record_at("alice", t0 + Duration::from_secs(i))
                .unwrap();
            assert_eq!(remaining, 9 - i as usize);
        }
        let err = limiter
            .check_and_record_at("alice", t0 + Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, TollgateError::RateLimitExceeded { limit: 10, .. }));
    }

    #[test]
    fn refused_request_is_not_recorded() {
        let limiter = RateLimiter::new(1, WINDOW);
        let t0 = Instant::now();
        limiter.check_and_record_at("bob", t0).unwrap();
        for s in 1..30 {
            assert!(
                limiter
                    .check_and_record_at("bob", t0 + Duration::from_secs(s))
                    .is_err()
            );
        }
        // Only the admitted request occupies the window.
        assert_eq!(limiter.check_and_record_at("bob", t0 + WINDOW).unwrap(), 0);
    }

    #[test]
    fn entries_expire_exactly_at_window_boundary() {
        let limiter = RateLimiter::new(2, WINDOW);
        let t0 = Instant::now();
        limiter.check_and_record_at("carol", t0).unwrap();
        limiter.check_and_record_at("carol", t0 + Duration::from_secs(30)).unwrap();

        assert!(
            limiter
                .check_and_record_at("carol", t0 + Duration::from_millis(59_999))
                .is_err()
        );
        assert_eq!(
            limiter.check_and_record_at("carol", t0 + WINDOW).unwrap(),
            0
        );
    }

    #[test]
    fn users_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);
        let now = Instant::now();
        limiter.check_and_record_at("alice", now).unwrap();
        assert!(limiter.check_and_record_at("alice", now).is_err());
        assert!(limiter.check_and_record_at("bob", now).is_ok());
        assert_eq!(limiter.tracked_users(), 2);
    }

    #[test]
    fn remaining_does_not_charge() {
        let limiter = RateLimiter::new(3, WINDOW);
        let t0 = Instant::now();
        assert_eq!(limiter.remaining_at("dave", t0), 3);
        limiter.check_and_record_at("dave", t0).unwrap();
        assert_eq!(limiter.remaining_at("dave", t0), 2);
        assert_eq!(limiter.remaining_at("dave", t0), 2);
        assert_eq!(limiter.remaining_at("dave", t0 + WINDOW), 3);
    }

    #[test]
    fn concurrent_callers_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new(10, WINDOW));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| limiter.check_and_record("erin").is_ok())
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }

    proptest::proptest! {
        #[test]
        fn window_never_holds_more_than_limit(
            limit in 1usize..20,
            gaps in proptest::collection::vec(0u64..30_000, 1..120),
        ) {
            let limiter = RateLimiter::new(limit, WINDOW);
            let t0 = Instant::now();
            let mut elapsed = 0u64;
            let mut admitted: Vec<u64> = Vec::new();
            for gap in gaps {
                elapsed += gap;
                let now = t0 + Duration::from_millis(elapsed);
                if limiter.check_and_record_at("p", now).is_ok() {
                    admitted.push(elapsed);
                }
                let in_window = admitted
                    .iter()
                    .filter(|&&t| elapsed - t < WINDOW.as_millis() as u64)
                    .count();
                proptest::prop_assert!(in_window <= limit);
            }
        }
    }
}
