//! Per-key payout rate limiting.
//!
//! A request claims every key it is made under (recipient address and client
//! IP) for one interval. Claims are rolled back when the request does not end
//! in a payout, so failed attempts never lock anybody out.

use axum::http::HeaderMap;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    net::SocketAddr,
    time::{Duration, Instant},
};

/// A key is still inside its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    /// Time until the key frees up
    pub remaining: Duration,
}

impl RateLimited {
    /// Remaining wait rounded to whole seconds, formatted for humans.
    pub fn message(&self) -> String {
        let secs = (self.remaining.as_millis() + 500) / 1000;
        format!(
            "You have exceeded the rate limit. Please wait {} before you try again",
            humantime::format_duration(Duration::from_secs(secs as u64))
        )
    }
}

#[derive(Debug)]
pub struct Limiter {
    ttl: Duration,
    proxy_count: usize,
    entries: Mutex<HashMap<String, Instant>>,
}

/// Longest window a claim is held for.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

impl Limiter {
    /// A zero `ttl` disables limiting. Longer windows are capped at [`MAX_TTL`].
    pub fn new(ttl: Duration, proxy_count: usize) -> Self {
        Self {
            ttl: ttl.min(MAX_TTL),
            proxy_count,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub const fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Client IP as seen through the configured number of reverse proxies.
    pub fn client_ip(&self, headers: &HeaderMap, remote: SocketAddr) -> String {
        client_ip(self.proxy_count, headers, remote)
    }

    /// Claim all `keys` for one interval, or report the first one still claimed.
    ///
    /// Checking and claiming happen under one lock. The claim is released when
    /// the guard drops unless [`LimitGuard::commit`] is called.
    pub fn acquire(&self, keys: &[&str]) -> Result<LimitGuard<'_>, RateLimited> {
        if !self.is_enabled() {
            return Ok(LimitGuard::new(self, Vec::new()));
        }

        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, expiry| *expiry > now);

        for key in keys {
            if let Some(expiry) = entries.get(*key) {
                return Err(RateLimited {
                    remaining: expiry.saturating_duration_since(now),
                });
            }
        }

        // Entries are never extended on hit
        for key in keys {
            entries.insert((*key).to_string(), now + self.ttl);
        }

        Ok(LimitGuard::new(
            self,
            keys.iter().map(|key| (*key).to_string()).collect(),
        ))
    }

    fn release(&self, keys: &[String]) {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(key);
        }
    }

    /// Number of live claims.
    #[cfg(test)]
    fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|expiry| **expiry > now)
            .count()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Claims held by an in-flight request.
#[must_use = "dropping the guard releases the claim"]
#[derive(Debug)]
pub struct LimitGuard<'a> {
    limiter: &'a Limiter,
    keys: Vec<String>,
    committed: bool,
}

impl<'a> LimitGuard<'a> {
    const fn new(limiter: &'a Limiter, keys: Vec<String>) -> Self {
        Self {
            limiter,
            keys,
            committed: false,
        }
    }

    /// Keep the claims until they expire.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for LimitGuard<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.keys.is_empty() {
            self.limiter.release(&self.keys);
        }
    }
}

/// Resolve the client IP.
///
/// With `proxy_count` trusted proxies in front, the client is the entry
/// `proxy_count` places from the end of `X-Forwarded-For`; anything before it
/// may be forged by the client.
pub fn client_ip(proxy_count: usize, headers: &HeaderMap, remote: SocketAddr) -> String {
    if proxy_count > 0 {
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty());

        if let Some(forwarded) = forwarded {
            let parts: Vec<&str> = forwarded.split(',').collect();
            let index = parts.len().saturating_sub(proxy_count);
            if let Some(part) = parts.get(index) {
                return part.trim().to_string();
            }
        }
    }

    remote.ip().to_string()
}
