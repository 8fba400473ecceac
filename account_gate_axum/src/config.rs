//! Central configuration for the account_gate_axum crate

use std::sync::LazyLock;

/// Landing surface after confirmation and login
/// Default: "/Home/Index"
pub static ACCOUNT_HOME_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("ACCOUNT_HOME_URL").unwrap_or_else(|_| "/Home/Index".to_string())
});

/// Name of the cookie carrying the sign-in session id
///
/// The cookie is always `Secure`, so browsers store it only over HTTPS or on localhost.
/// Default: "__Host-AccountSession"
pub static SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "__Host-AccountSession".to_string())
});
