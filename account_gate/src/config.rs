//! Central configuration for the account_gate crate

use std::sync::LazyLock;
use std::time::Duration;

/// Route prefix under which the account endpoints are mounted
///
/// Default: "/Accounts"
pub static ACCOUNT_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("ACCOUNT_ROUTE_PREFIX").unwrap_or_else(|_| "/Accounts".to_string())
});

/// Upper bound for a single identity provider call
///
/// Default: 10 seconds
pub static PROVIDER_TIMEOUT: LazyLock<Duration> = LazyLock::new(|| {
    Duration::from_secs(parse_secs(
        std::env::var("PROVIDER_TIMEOUT_SECS").ok().as_deref(),
        10,
    ))
});

/// Lifetime of a sign-in session without the remember flag
///
/// Default: 1 day
pub static SESSION_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    parse_secs(std::env::var("SESSION_MAX_AGE").ok().as_deref(), 86400)
});

/// Lifetime of a sign-in session created with the remember flag
///
/// Default: 30 days
pub static SESSION_REMEMBER_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    parse_secs(
        std::env::var("SESSION_REMEMBER_MAX_AGE").ok().as_deref(),
        30 * 86400,
    )
});

fn parse_secs(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|s| s.trim().parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
