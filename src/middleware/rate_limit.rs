//! Rate limiting
//!
//! Sliding-window limiter with a burst allowance, keyed by an arbitrary
//! string (sign-in attempts are keyed by normalized email).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::utils::errors::{HostelBridgeError, Result};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window_duration: Duration,
    /// Burst allowance (extra requests allowed in short bursts)
    pub burst_allowance: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_duration: Duration::from_secs(300),
            burst_allowance: 2,
        }
    }
}

impl From<&AuthConfig> for RateLimitConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            max_requests: auth.sign_in_max_attempts,
            window_duration: Duration::from_secs(auth.sign_in_window_seconds),
            burst_allowance: auth.sign_in_burst,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    requests: Vec<Instant>,
    burst_used: u32,
    last_reset: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            burst_used: 0,
            last_reset: Instant::now(),
        }
    }

    /// Drop requests that fell out of the window
    fn cleanup(&mut self, window_duration: Duration) {
        let now = Instant::now();
        self.requests
            .retain(|&time| now.duration_since(time) < window_duration);

        if self.last_reset.elapsed() > window_duration {
            self.burst_used = 0;
            self.last_reset = now;
        }
    }

    fn is_allowed(&mut self, config: &RateLimitConfig) -> bool {
        self.cleanup(config.window_duration);

        if (self.requests.len() as u32) < config.max_requests {
            return true;
        }

        if self.burst_used < config.burst_allowance {
            self.burst_used += 1;
            return true;
        }

        false
    }
}

/// Per-key sliding window limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        // A poisoned map only holds timestamps; keep using it
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an attempt for `key`, failing once the window and burst are used up
    pub fn check(&self, key: &str) -> Result<()> {
        let mut entries = self.entries();
        let entry = entries.entry(key.to_string()).or_insert_with(RateLimitEntry::new);

        if entry.is_allowed(&self.config) {
            entry.requests.push(Instant::now());
            debug!(key = %key, "Rate limit check passed");
            Ok(())
        } else {
            warn!(key = %key, "Rate limit exceeded");
            Err(HostelBridgeError::RateLimitExceeded)
        }
    }

    /// Forget a key, e.g. after a successful sign-in
    pub fn clear(&self, key: &str) -> bool {
        let removed = self.entries().remove(key).is_some();
        if removed {
            debug!(key = %key, "Rate limit cleared");
        }
        removed
    }

    /// Drop keys with no requests in the last two windows
    pub fn cleanup_old_entries(&self) -> usize {
        let mut entries = self.entries();
        let keep_for = self.config.window_duration * 2;
        let before = entries.len();
        entries.retain(|_, entry| entry.requests.iter().any(|time| time.elapsed() < keep_for));

        let removed = before - entries.len();
        if removed > 0 {
            info!(removed = removed, "Cleaned up old rate limit entries");
        }
        removed
    }

    /// Periodically drop stale keys
    pub fn start_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                limiter.cleanup_old_entries();
            }
        });

        info!("Started rate limit cleanup task with interval {:?}", interval);
        handle
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.entries().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_basic() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 3,
            window_duration: Duration::from_secs(60),
            burst_allowance: 1,
        });

        assert!(limiter.check("asha@example.org").is_ok());
        assert!(limiter.check("asha@example.org").is_ok());
        assert!(limiter.check("asha@example.org").is_ok());

        // 4th request uses the burst allowance
        assert!(limiter.check("asha@example.org").is_ok());
        assert!(limiter.check("asha@example.org").is_err());

        // Keys are independent
        assert!(limiter.check("ravi@example.org").is_ok());
    }

    #[test]
    fn test_clear_resets_key() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window_duration: Duration::from_secs(60),
            burst_allowance: 0,
        });

        limiter.check("k").unwrap();
        assert!(limiter.check("k").is_err());

        assert!(limiter.clear("k"));
        assert!(!limiter.clear("k"));
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn test_cleanup_keeps_recent_entries() {
        let limiter = RateLimiter::default();
        limiter.check("k").unwrap();
        assert_eq!(limiter.cleanup_old_entries(), 0);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_cleanup_purges_entries_older_than_two_windows() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window_duration: Duration::from_millis(10),
            burst_allowance: 0,
        });
        limiter.check("nobody@example.org").unwrap();
        limiter.check("someone@example.org").unwrap();

        std::thread::sleep(Duration::from_millis(30));
        limiter.check("fresh@example.org").unwrap();

        assert_eq!(limiter.cleanup_old_entries(), 2);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_purges_stale_keys() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window_duration: Duration::from_millis(5),
            burst_allowance: 0,
        });
        limiter.check("ghost@example.org").unwrap();

        let handle = limiter.start_cleanup(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(limiter.tracked_keys(), 0);
    }
}
