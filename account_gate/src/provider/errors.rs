use thiserror::Error;

use crate::utils::UtilError;

/// Faults raised while talking to the identity provider
///
/// Account-level rejections (duplicate user, wrong code, bad password) are not
/// errors at this level; they come back inside `IdentityResult` or `SignInResult`.
#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity provider call timed out")]
    Timeout,

    #[error("Invalid response from identity provider: {0}")]
    InvalidResponse(String),

    #[error("Identity provider configuration error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

/// Errors from mutating a provider user's attribute mapping
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Attribute already present: {0}")]
    Duplicate(String),
}
