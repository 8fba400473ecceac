use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::provider::errors::{AttributeError, ProviderError};
use crate::session::Session;

/// Standard attribute carrying the account's email address
pub const ATTR_EMAIL: &str = "email";
/// Standard attribute carrying the account's display name
pub const ATTR_NAME: &str = "name";

/// Provider-side account status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    Unconfirmed,
    Confirmed,
    ForceChangePassword,
    ResetRequired,
    Archived,
    Compromised,
    Unknown(String),
}

impl From<&str> for UserStatus {
    fn from(status: &str) -> Self {
        match status {
            "UNCONFIRMED" => Self::Unconfirmed,
            "CONFIRMED" => Self::Confirmed,
            "FORCE_CHANGE_PASSWORD" => Self::ForceChangePassword,
            "RESET_REQUIRED" => Self::ResetRequired,
            "ARCHIVED" => Self::Archived,
            "COMPROMISED" => Self::Compromised,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unconfirmed => "UNCONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            Self::ResetRequired => "RESET_REQUIRED",
            Self::Archived => "ARCHIVED",
            Self::Compromised => "COMPROMISED",
            Self::Unknown(other) => other,
        };
        f.write_str(s)
    }
}

/// Attribute mapping of a provider user. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, rejecting a name that is already present
    pub fn add(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        if self.0.contains_key(name) {
            return Err(AttributeError::Duplicate(name.to_string()));
        }
        self.0.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Handle for an account as seen by the identity provider
///
/// Obtained from a lookup, optionally given attributes, then handed back to the
/// provider for creation or confirmation. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub email: String,
    pub status: Option<UserStatus>,
    pub attributes: Attributes,
}

impl ProviderUser {
    /// Handle for an account the provider does not know yet
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            status: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_status(email: &str, status: UserStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::new(email)
        }
    }

    /// An account exists on the provider side iff it reports a status
    pub fn exists(&self) -> bool {
        self.status.is_some()
    }
}

/// A single provider-reported rejection reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityError {
    pub code: String,
    pub description: String,
}

impl IdentityError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Result of an account creation or confirmation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityResult {
    Succeeded,
    Failed(Vec<IdentityError>),
}

impl IdentityResult {
    pub fn failed(code: &str, description: &str) -> Self {
        Self::Failed(vec![IdentityError::new(code, description)])
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Result of a password sign-in attempt
#[derive(Debug, Clone)]
pub enum SignInResult {
    Succeeded(Session),
    /// Wrong password or unknown account
    Failed,
    /// Account exists but may not sign in yet, e.g. unconfirmed
    NotAllowed,
    LockedOut,
}

/// Capabilities the mediator needs from a hosted identity provider
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Get a handle for `email`; the status is absent when no account exists
    async fn lookup_user(&self, email: &str) -> Result<ProviderUser, ProviderError>;

    /// Find an existing account by its email attribute
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<ProviderUser>, ProviderError>;

    /// Request creation of `user` with `password`
    async fn create_user(
        &self,
        user: &ProviderUser,
        password: &str,
        validation_data: &Attributes,
    ) -> Result<IdentityResult, ProviderError>;

    /// Submit a signup confirmation code for `user`
    async fn confirm_sign_up(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<IdentityResult, ProviderError>;

    /// Verify the password and issue a session on success
    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderError>;

    /// Resolve a previously issued session id
    async fn resolve_session(&self, session_id: &str) -> Result<Option<Session>, ProviderError>;

    /// End `session` on the provider side
    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError>;
}
