use thiserror::Error;

use crate::provider::{AttributeError, IdentityError, ProviderError};

/// Display-ready error entry attached to a redisplayed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub key: String,
    pub message: String,
}

impl ModelError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failures of the account operations
///
/// None of these propagate to the caller as faults; each is turned into error
/// entries on a redisplayed form.
#[derive(Debug, Error, Clone)]
pub enum MediatorError {
    /// Form failed shape validation
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<ModelError>),

    #[error("User already exists")]
    UserExists,

    #[error("Account not found")]
    AccountNotFound,

    /// Creation or confirmation denied by the provider
    #[error("Provider rejected the request: {}", describe(.0))]
    ProviderRejected(Vec<IdentityError>),

    /// Sign-in failed, cause deliberately not exposed
    #[error("Credential mismatch")]
    CredentialMismatch,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),
}

impl From<ProviderError> for MediatorError {
    fn from(err: ProviderError) -> Self {
        Self::ProviderUnavailable(err.to_string())
    }
}

fn describe(errors: &[IdentityError]) -> String {
    errors
        .iter()
        .map(|e| e.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl MediatorError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Validation(errors) => tracing::debug!("Validation failed: {:?}", errors),
            Self::UserExists => tracing::info!("Signup for an existing account"),
            Self::AccountNotFound => tracing::info!("Confirmation for an unknown account"),
            Self::ProviderRejected(errors) => {
                tracing::info!("Provider rejected the request: {}", describe(errors))
            }
            Self::CredentialMismatch => tracing::info!("Credential mismatch"),
            Self::ProviderUnavailable(detail) => {
                tracing::error!("Identity provider unavailable: {}", detail)
            }
            Self::Attribute(err) => tracing::error!("Attribute error: {}", err),
        }
        self
    }

    /// Error entries to show next to the redisplayed form
    ///
    /// Provider internals never reach the user for unavailable providers.
    pub fn into_model_errors(self) -> Vec<ModelError> {
        match self {
            Self::Validation(errors) => errors,
            Self::UserExists => vec![ModelError::new(
                "UserExists",
                "User with this email already exists",
            )],
            Self::AccountNotFound => vec![ModelError::new(
                "NotFound",
                "A user with the given email address was not found",
            )],
            Self::ProviderRejected(errors) if errors.is_empty() => vec![ModelError::new(
                "ProviderRejected",
                "The request was rejected by the identity provider",
            )],
            Self::ProviderRejected(errors) => errors
                .into_iter()
                .map(|e| ModelError::new(e.code, e.description))
                .collect(),
            Self::CredentialMismatch => vec![ModelError::new(
                "LoginError",
                "Email and password do not match",
            )],
            Self::ProviderUnavailable(_) => vec![ModelError::new(
                "ProviderUnavailable",
                "The account service is temporarily unavailable. Please try again later.",
            )],
            Self::Attribute(_) => vec![ModelError::new(
                "InvalidParameter",
                "The account details could not be prepared",
            )],
        }
    }
}
