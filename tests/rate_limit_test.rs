//! Integration tests for the sliding window rate limiter

use bandtogether::rate_limit::{
    check_feedback_rate_limit, check_login_rate_limit, check_message_rate_limit,
    check_report_rate_limit, clear_login_attempts, RateLimiter,
};
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn test_login_rate_limit_blocks_sixth_attempt() {
    for i in 0..5 {
        assert!(
            check_login_rate_limit("10.0.0.1", "guitarist").is_ok(),
            "Login attempt {} should be allowed",
            i + 1
        );
    }
    let err = check_login_rate_limit("10.0.0.1", "guitarist").unwrap_err();
    assert!(err.retry_after_seconds > 0);
    assert!(err.retry_after_seconds <= 301);

    // Other usernames from the same address are tracked separately.
    assert!(check_login_rate_limit("10.0.0.1", "drummer").is_ok());

    clear_login_attempts("10.0.0.1", "guitarist");
    assert!(check_login_rate_limit("10.0.0.1", "guitarist").is_ok());
}

#[test]
#[serial]
fn test_message_rate_limit_per_profile() {
    for _ in 0..10 {
        assert!(check_message_rate_limit(101).is_ok());
    }
    assert!(check_message_rate_limit(101).is_err());
    assert!(check_message_rate_limit(102).is_ok());
}

#[test]
#[serial]
fn test_report_and_feedback_limits() {
    for _ in 0..5 {
        assert!(check_report_rate_limit(201).is_ok());
        assert!(check_feedback_rate_limit("10.0.0.2").is_ok());
    }
    assert!(check_report_rate_limit(201).is_err());
    assert!(check_feedback_rate_limit("10.0.0.2").is_err());
}

#[test]
fn test_window_expires() {
    let limiter = RateLimiter::new();
    let window = Duration::from_millis(50);

    assert!(limiter.check_rate_limit("report", "1", 1, window).is_ok());
    assert!(limiter.check_rate_limit("report", "1", 1, window).is_err());

    std::thread::sleep(Duration::from_millis(80));
    assert!(limiter.check_rate_limit("report", "1", 1, window).is_ok());
}

#[test]
fn test_actions_do_not_share_budget() {
    let limiter = RateLimiter::new();
    let window = Duration::from_secs(60);

    assert!(limiter.check_rate_limit("message", "7", 1, window).is_ok());
    assert!(limiter.check_rate_limit("report", "7", 1, window).is_ok());
    assert!(limiter.check_rate_limit("message", "7", 1, window).is_err());
    assert_eq!(limiter.tracked_keys_count(), 2);

    limiter.clear_requests("message", "7");
    assert!(limiter.check_rate_limit("message", "7", 1, window).is_ok());
}
