// SPDX-License-Identifier: MIT

//! Per-remote-IP admission control for the login endpoint (spec.md §4.9)
//! and the event-channel origin allow-list.

use hearth_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;

/// Token bucket for a single IP: refills continuously at `rate_per_sec`,
/// capped at `rate_per_sec` tokens (a one-second burst).
struct Bucket {
    tokens: f64,
    last_refill_ms: u64,
}

/// Token-bucket rate limiter keyed by remote IP (spec.md §4.9 "default 10
/// req/s per IP"). Buckets are created lazily and never explicitly evicted —
/// homelab-scale IP churn is small enough that this is not a concern
/// (spec.md Non-goals: no distributed or persisted limiter state).
pub struct RateLimiter {
    rate_per_sec: f64,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    pub fn new(rate_per_sec: u32) -> Self {
        Self { rate_per_sec: rate_per_sec.max(1) as f64, buckets: Mutex::new(HashMap::new()) }
    }

    /// Attempt to consume one token for `addr` at `now_ms`. Returns `false`
    /// when the bucket is empty (spec.md: over-limit requests fail
    /// `TooManyRequests`).
    pub fn check(&self, addr: IpAddr, now_ms: u64) -> bool {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(addr).or_insert_with(|| Bucket { tokens: self.rate_per_sec, last_refill_ms: now_ms });

        let elapsed_ms = now_ms.saturating_sub(bucket.last_refill_ms) as f64;
        bucket.tokens = (bucket.tokens + elapsed_ms / 1000.0 * self.rate_per_sec).min(self.rate_per_sec);
        bucket.last_refill_ms = now_ms;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Checks an `Origin` header against an allow-list (spec.md §4.9):
/// an empty list admits any origin, a non-empty list supports exact and
/// `*.suffix` wildcard-subdomain matches, and a missing header (non-browser
/// client) is always admitted.
pub fn origin_allowed(allowed: &[String], origin_header: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(origin) = origin_header else {
        return true;
    };
    let host = strip_scheme(origin);
    allowed.iter().any(|pattern| match pattern.strip_prefix("*.") {
        Some(suffix) => host.ends_with(suffix) && host.len() > suffix.len() && host.as_bytes()[host.len() - suffix.len() - 1] == b'.',
        None => pattern == origin || pattern == host,
    })
}

fn strip_scheme(origin: &str) -> &str {
    origin.split("://").nth(1).unwrap_or(origin)
}

/// Extracts the effective client IP: `X-Forwarded-For`/`X-Real-IP` when
/// present, else the socket peer (spec.md §4.9).
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>, peer: IpAddr) -> IpAddr {
    if let Some(value) = forwarded_for {
        if let Some(first) = value.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }
    if let Some(value) = real_ip {
        if let Ok(ip) = value.trim().parse() {
            return ip;
        }
    }
    peer
}

pub fn now_ms(clock: &impl Clock) -> u64 {
    clock.epoch_ms()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))
    }

    #[test]
    fn allows_requests_within_the_burst() {
        let limiter = RateLimiter::new(5);
        for _ in 0..5 {
            assert!(limiter.check(ip(), 0));
        }
        assert!(!limiter.check(ip(), 0));
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.check(ip(), 0));
        assert!(limiter.check(ip(), 0));
        assert!(!limiter.check(ip(), 0));
        assert!(limiter.check(ip(), 1000));
    }

    #[test]
    fn separate_ips_have_separate_buckets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.check(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 0));
        assert!(limiter.check(IpAddr::V4(Ipv4Addr::new(2, 2, 2, 2)), 0));
    }

    #[test]
    fn empty_allow_list_admits_any_origin() {
        assert!(origin_allowed(&[], Some("https://evil.example")));
    }

    #[test]
    fn missing_origin_header_is_admitted() {
        assert!(origin_allowed(&["home.lan".to_string()], None));
    }

    #[test]
    fn exact_match_is_admitted() {
        assert!(origin_allowed(&["home.lan".to_string()], Some("https://home.lan")));
    }

    #[test]
    fn wildcard_subdomain_matches() {
        let allowed = vec!["*.home.lan".to_string()];
        assert!(origin_allowed(&allowed, Some("https://nas.home.lan")));
        assert!(!origin_allowed(&allowed, Some("https://home.lan")));
        assert!(!origin_allowed(&allowed, Some("https://evilhome.lan")));
    }

    #[test]
    fn mismatched_origin_is_denied() {
        assert!(!origin_allowed(&["home.lan".to_string()], Some("https://evil.example")));
    }

    #[test]
    fn forwarded_for_header_wins_over_peer() {
        let ip = client_ip(Some("203.0.113.5, 10.0.0.1"), None, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(ip, "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn falls_back_to_peer_without_headers() {
        let peer = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(client_ip(None, None, peer), peer);
    }
}
