//! Sliding window limits on the forms people abuse: login, sign up, inbox
//! messages, reports and feedback.
//!
//! Counters live in process memory, so every instance keeps its own. The
//! limits themselves come from the `[rate_limit]` config section and are
//! swapped in at startup by [`init_rate_limits`].

use arc_swap::ArcSwap;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub static RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(RateLimiter::new);

static LIMITS: Lazy<ArcSwap<RateLimitConfig>> =
    Lazy::new(|| ArcSwap::from_pointee(RateLimitConfig::default()));

/// Nothing is kept longer than the widest window.
const PRUNE_HORIZON: Duration = Duration::from_secs(3600);

/// A budget of `max` hits per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub max: usize,
    pub window: Duration,
}

impl Limit {
    fn new(max: u32, window_secs: u64) -> Self {
        Self {
            max: max as usize,
            window: Duration::from_secs(window_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login: Limit,
    pub registration: Limit,
    pub message: Limit,
    pub report: Limit,
    pub feedback: Limit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from_config(&crate::app_config::RateLimitConfig::default())
    }
}

impl RateLimitConfig {
    pub fn from_config(section: &crate::app_config::RateLimitConfig) -> Self {
        Self {
            login: Limit::new(section.login_max_attempts, section.login_window_seconds as u64),
            registration: Limit::new(section.registration_per_hour, 3600),
            message: Limit::new(section.messages_per_minute, 60),
            report: Limit::new(section.reports_per_5_minutes, 300),
            feedback: Limit::new(section.feedback_per_hour, 3600),
        }
    }
}

pub fn init_rate_limits(section: &crate::app_config::RateLimitConfig) {
    LIMITS.store(Arc::new(RateLimitConfig::from_config(section)));
    log::info!("Rate limits loaded");
}

fn limits() -> Arc<RateLimitConfig> {
    LIMITS.load_full()
}

#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Whole seconds until the oldest hit leaves the window, rounded up.
    pub retry_after_seconds: u64,
}

/// Hit timestamps keyed by `action:identifier`.
#[derive(Default)]
pub struct RateLimiter {
    hits: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit for `identifier` under `action`, or refuses it when the
    /// window is already full. Refused hits are not recorded.
    pub fn check_rate_limit(
        &self,
        action: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let mut hits = self.hits.entry(format!("{}:{}", action, identifier)).or_default();
        hits.retain(|&at| now.duration_since(at) < window);

        if let Some(&oldest) = hits.first().filter(|_| hits.len() >= max_requests) {
            let remaining = window.saturating_sub(now.duration_since(oldest));
            return Err(RateLimitError {
                retry_after_seconds: remaining.as_secs() + 1,
            });
        }

        hits.push(now);
        Ok(())
    }

    /// Drops stale timestamps and the keys left empty.
    pub fn cleanup_old_entries(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.retain(|&at| now.duration_since(at) < PRUNE_HORIZON);
            !hits.is_empty()
        });
    }

    pub fn clear_requests(&self, action: &str, identifier: &str) {
        self.hits.remove(&format!("{}:{}", action, identifier));
    }

    pub fn tracked_keys_count(&self) -> usize {
        self.hits.len()
    }
}

fn check(action: &str, identifier: &str, limit: Limit) -> Result<(), RateLimitError> {
    RATE_LIMITER.check_rate_limit(action, identifier, limit.max, limit.window)
}

/// Keyed by IP and username together, so one address can't lock out a user.
pub fn check_login_rate_limit(ip: &str, username: &str) -> Result<(), RateLimitError> {
    check("login", &format!("{}:{}", ip, username), limits().login)
}

pub fn clear_login_attempts(ip: &str, username: &str) {
    RATE_LIMITER.clear_requests("login", &format!("{}:{}", ip, username));
}

pub fn check_registration_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    check("register", ip, limits().registration)
}

/// Covers both new conversations and replies.
pub fn check_message_rate_limit(profile_id: i32) -> Result<(), RateLimitError> {
    check("message", &profile_id.to_string(), limits().message)
}

pub fn check_report_rate_limit(profile_id: i32) -> Result<(), RateLimitError> {
    check("report", &profile_id.to_string(), limits().report)
}

pub fn check_feedback_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    check("feedback", ip, limits().feedback)
}

/// Run periodically from the server binary.
pub fn prune() {
    RATE_LIMITER.cleanup_old_entries();
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[test]
    fn test_fourth_hit_is_refused_with_retry_hint() {
        let limiter = RateLimiter::new();
        for i in 0..3 {
            assert!(
                limiter.check_rate_limit("test", "drummer", 3, WINDOW).is_ok(),
                "hit {} should pass",
                i
            );
        }

        let err = limiter
            .check_rate_limit("test", "drummer", 3, WINDOW)
            .unwrap_err();
        assert!(err.retry_after_seconds > 0 && err.retry_after_seconds <= 10);
    }

    #[test]
    fn test_identifiers_have_separate_budgets() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            limiter.check_rate_limit("test", "drummer", 3, WINDOW).unwrap();
        }
        assert!(limiter.check_rate_limit("test", "bassist", 3, WINDOW).is_ok());
    }

    #[test]
    fn test_cleanup_keeps_recent_hits() {
        let limiter = RateLimiter::new();
        limiter.check_rate_limit("test", "a", 10, WINDOW).unwrap();
        limiter.check_rate_limit("test", "b", 10, WINDOW).unwrap();

        limiter.cleanup_old_entries();
        assert_eq!(limiter.tracked_keys_count(), 2);
    }

    #[test]
    fn test_default_limits() {
        let config = RateLimitConfig::default();
        assert_eq!(config.login, Limit::new(5, 300));
        assert_eq!(config.registration.max, 3);
        assert_eq!(config.message.max, 10);
        assert_eq!(config.report, Limit::new(5, 300));
        assert_eq!(config.feedback.window, Duration::from_secs(3600));
    }

    #[test]
    fn test_limits_follow_config_section() {
        let section = crate::app_config::RateLimitConfig {
            messages_per_minute: 2,
            ..Default::default()
        };
        let limit = RateLimitConfig::from_config(&section).message;
        assert_eq!(limit.max, 2);

        let limiter = RateLimiter::new();
        assert!(limiter.check_rate_limit("message", "7", limit.max, limit.window).is_ok());
        assert!(limiter.check_rate_limit("message", "7", limit.max, limit.window).is_ok());
        assert!(limiter.check_rate_limit("message", "7", limit.max, limit.window).is_err());
    }
}
