// Path: crates/services/src/rate_guard/mod.rs
//! Rate-limit and IP-policy guard (C9, spec §4.9). Pure in-memory state: no
//! store port is involved, only the shared clock.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rental_api::ports::ClockPort;
use rental_types::error::RateLimitError;
use rental_types::ids::UserId;
use std::sync::Arc;
use tracing::warn;

/// Substrings of known vulnerability-scanner user agents (spec §4.9).
const MALICIOUS_UA_SUBSTRINGS: [&str; 5] = ["sqlmap", "nikto", "nmap", "masscan", "zap"];

/// Requests slower than this are logged but never blocked (spec §4.9).
const SLOW_REQUEST_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(2);

/// How long a source IP stays blocked after a scanner-pattern hit (spec §4.9).
const SCANNER_BLOCK_DURATION: Duration = Duration::hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Api,
    Auth,
    Admin,
    Default,
}

impl Bucket {
    fn limit(self) -> (u32, Duration) {
        match self {
            Bucket::Api => (1000, Duration::hours(1)),
            Bucket::Auth => (100, Duration::minutes(15)),
            Bucket::Admin => (1000, Duration::hours(1)),
            Bucket::Default => (100, Duration::hours(1)),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Bucket::Api => "api",
            Bucket::Auth => "auth",
            Bucket::Admin => "admin",
            Bucket::Default => "default",
        }
    }
}

type CounterKey = (Bucket, String, Option<UserId>);

/// Per-(bucket, ip, user) sliding-window limiter plus a cached blocked-IP
/// set (spec §4.9). One instance is shared across the process.
pub struct RateGuard {
    clock: Arc<dyn ClockPort>,
    counters: DashMap<CounterKey, Vec<DateTime<Utc>>>,
    blocked_ips: DashMap<String, DateTime<Utc>>,
}

impl RateGuard {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            clock,
            counters: DashMap::new(),
            blocked_ips: DashMap::new(),
        }
    }

    /// `check` (spec §4.9): evaluates the blocked-IP set, the scanner
    /// user-agent filter, and the bucket's sliding window, in that order.
    pub fn check(
        &self,
        bucket: Bucket,
        ip: &str,
        user_id: Option<UserId>,
        user_agent: &str,
    ) -> Result<(), RateLimitError> {
        let now = self.clock.now();
        if let Some(expires_at) = self.blocked_ips.get(ip).map(|r| *r) {
            if expires_at > now {
                rental_telemetry::rate_limit_metrics().inc_blocked_ip_rejected();
                return Err(RateLimitError::Blocked);
            }
            self.blocked_ips.remove(ip);
        }

        let ua_lower = user_agent.to_ascii_lowercase();
        if MALICIOUS_UA_SUBSTRINGS.iter().any(|needle| ua_lower.contains(needle)) {
            self.blocked_ips.insert(ip.to_string(), now + SCANNER_BLOCK_DURATION);
            rental_telemetry::rate_limit_metrics().set_blocked_ip_count(self.blocked_ips.len() as u64);
            rental_telemetry::rate_limit_metrics().inc_malicious_ua_rejected();
            return Err(RateLimitError::Blocked);
        }

        let (limit, window) = bucket.limit();
        let key = (bucket, ip.to_string(), user_id);
        let mut entry = self.counters.entry(key).or_default();
        entry.retain(|t| now - *t < window);
        if entry.len() as u32 >= limit {
            let retry_after_secs = entry
                .first()
                .map(|oldest| (*oldest + window - now).num_seconds().max(0) as u64)
                .unwrap_or(window.num_seconds() as u64);
            rental_telemetry::rate_limit_metrics().inc_rate_limited(bucket.label());
            return Err(RateLimitError::Exceeded { retry_after_secs });
        }
        entry.push(now);
        Ok(())
    }

    /// Logs (but never blocks on) a request whose handler took longer than
    /// [`SLOW_REQUEST_THRESHOLD`] (spec §4.9).
    pub fn observe_request_duration(&self, endpoint: &str, duration: std::time::Duration) {
        if duration > SLOW_REQUEST_THRESHOLD {
            warn!(endpoint, duration_ms = duration.as_millis() as u64, "slow request");
        }
    }

    /// Sweeps expired blocked-IP entries and empty counter windows so the
    /// maps do not grow unbounded (spec §5, "eventually consistent ... TTL").
    pub fn evict_expired(&self) {
        let now = self.clock.now();
        self.blocked_ips.retain(|_, expires_at| *expires_at > now);
        self.counters.retain(|key, timestamps| {
            let (_, window) = key.0.limit();
            timestamps.retain(|t| now - *t < window);
            !timestamps.is_empty()
        });
        rental_telemetry::rate_limit_metrics().set_blocked_ip_count(self.blocked_ips.len() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_api::ports::SystemClock;

    #[test]
    fn scanner_user_agent_blocks_the_ip() {
        let guard = RateGuard::new(Arc::new(SystemClock));
        let err = guard.check(Bucket::Api, "10.0.0.1", None, "sqlmap/1.0").unwrap_err();
        assert!(matches!(err, RateLimitError::Blocked));
        let err = guard.check(Bucket::Api, "10.0.0.1", None, "curl/8.0").unwrap_err();
        assert!(matches!(err, RateLimitError::Blocked));
    }

    #[test]
    fn auth_bucket_exhausts_after_its_limit() {
        let guard = RateGuard::new(Arc::new(SystemClock));
        for _ in 0..100 {
            guard.check(Bucket::Auth, "10.0.0.2", None, "curl/8.0").unwrap();
        }
        let err = guard.check(Bucket::Auth, "10.0.0.2", None, "curl/8.0").unwrap_err();
        assert!(matches!(err, RateLimitError::Exceeded { .. }));
    }
}
