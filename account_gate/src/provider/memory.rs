use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::provider::errors::ProviderError;
use crate::provider::types::{
    ATTR_EMAIL, Attributes, IdentityError, IdentityProvider, IdentityResult, ProviderUser,
    SignInResult, UserStatus,
};
use crate::session::{Session, SessionTable};
use crate::utils::{gen_random_bytes, gen_random_digits};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 256;
const MAX_FAILED_ATTEMPTS: u32 = 5;
const CONFIRMATION_CODE_DIGITS: usize = 6;

struct StoredAccount {
    status: UserStatus,
    attributes: Attributes,
    /// Argon2 PHC string
    password_hash: String,
    confirmation_code: Option<String>,
    failed_attempts: u32,
    locked: bool,
}

/// Identity provider held entirely in process memory
///
/// Behaves like a hosted user pool for local development and tests: password
/// policy, confirmation codes, sign-in sessions and optional lockout.
/// Confirmation codes are logged because there is no mail transport.
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, StoredAccount>>,
    sessions: SessionTable,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_sessions(SessionTable::new())
    }

    pub fn with_sessions(sessions: SessionTable) -> Self {
        tracing::info!("Creating new in-memory identity provider");
        Self {
            accounts: Mutex::new(HashMap::new()),
            sessions,
        }
    }

    /// Confirmation code waiting to be submitted for `email`, if any
    pub async fn pending_confirmation_code(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .await
            .get(&normalize(email))
            .and_then(|account| account.confirmation_code.clone())
    }

    fn make_key(email: &str) -> String {
        normalize(email)
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, ProviderError> {
    let salt = SaltString::encode_b64(&gen_random_bytes(16)?)
        .map_err(|e| ProviderError::Crypto(format!("Password salt error: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ProviderError::Crypto(format!("Password hashing error: {e}")))
}

fn verify_password(password_hash: &str, password: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn check_password_policy(password: &str) -> Vec<IdentityError> {
    let mut errors = Vec::new();
    let mut reject = |description: &str| {
        errors.push(IdentityError::new("InvalidPassword", description));
    };

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        reject("Password did not conform with policy: Password not long enough");
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        reject("Password did not conform with policy: Password too long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        reject("Password did not conform with policy: Password must have uppercase characters");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        reject("Password did not conform with policy: Password must have lowercase characters");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        reject("Password did not conform with policy: Password must have numeric characters");
    }
    errors
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn lookup_user(&self, email: &str) -> Result<ProviderUser, ProviderError> {
        let accounts = self.accounts.lock().await;
        Ok(match accounts.get(&Self::make_key(email)) {
            Some(account) => ProviderUser::with_status(email, account.status.clone()),
            None => ProviderUser::new(email),
        })
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderUser>, ProviderError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(&Self::make_key(email)).map(|account| {
            let mut user = ProviderUser::with_status(email, account.status.clone());
            user.attributes = account.attributes.clone();
            user
        }))
    }

    async fn create_user(
        &self,
        user: &ProviderUser,
        password: &str,
        validation_data: &Attributes,
    ) -> Result<IdentityResult, ProviderError> {
        tracing::debug!(
            "Creating account for {} with {} validation entries",
            user.email,
            validation_data.len()
        );

        if user.attributes.get(ATTR_EMAIL).is_none() {
            return Ok(IdentityResult::failed(
                "InvalidParameter",
                "Attributes did not conform to the schema: email is required",
            ));
        }

        let policy_errors = check_password_policy(password);
        if !policy_errors.is_empty() {
            return Ok(IdentityResult::Failed(policy_errors));
        }

        let password_hash = hash_password(password)?;
        let code = gen_random_digits(CONFIRMATION_CODE_DIGITS)?;

        let mut accounts = self.accounts.lock().await;
        let key = Self::make_key(&user.email);
        if accounts.contains_key(&key) {
            return Ok(IdentityResult::failed(
                "UsernameExists",
                "An account with the given email already exists.",
            ));
        }

        accounts.insert(
            key,
            StoredAccount {
                status: UserStatus::Unconfirmed,
                attributes: user.attributes.clone(),
                password_hash,
                confirmation_code: Some(code.clone()),
                failed_attempts: 0,
                locked: false,
            },
        );

        tracing::info!("Confirmation code for {}: {}", user.email, code);
        Ok(IdentityResult::Succeeded)
    }

    async fn confirm_sign_up(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<IdentityResult, ProviderError> {
        let mut accounts = self.accounts.lock().await;
        let Some(account) = accounts.get_mut(&Self::make_key(&user.email)) else {
            return Ok(IdentityResult::failed(
                "UserNotFound",
                "Username/client id combination not found.",
            ));
        };

        if account.status == UserStatus::Confirmed {
            return Ok(IdentityResult::failed(
                "NotAuthorized",
                "User cannot be confirmed. Current status is CONFIRMED",
            ));
        }

        let matches = account
            .confirmation_code
            .as_deref()
            .is_some_and(|expected| bool::from(expected.as_bytes().ct_eq(code.trim().as_bytes())));
        if !matches {
            return Ok(IdentityResult::failed(
                "CodeMismatch",
                "Invalid verification code provided, please try again.",
            ));
        }

        // Email is the username here, so there is never an alias to take over
        tracing::debug!("Confirming {} (force: {})", user.email, force_confirm);
        account.status = UserStatus::Confirmed;
        account.confirmation_code = None;
        tracing::info!("Account confirmed: {}", user.email);
        Ok(IdentityResult::Succeeded)
    }

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderError> {
        let key = Self::make_key(email);
        let password_hash = match self.accounts.lock().await.get(&key) {
            None => return Ok(SignInResult::Failed),
            Some(account) if account.locked => return Ok(SignInResult::LockedOut),
            Some(account) => account.password_hash.clone(),
        };

        // Verify without holding the lock, hashing takes a while
        let verified = verify_password(&password_hash, password);

        {
            let mut accounts = self.accounts.lock().await;
            let Some(account) = accounts.get_mut(&key) else {
                return Ok(SignInResult::Failed);
            };

            if !verified {
                account.failed_attempts += 1;
                if lockout_on_failure && account.failed_attempts >= MAX_FAILED_ATTEMPTS {
                    tracing::warn!("Locking account after repeated failures: {}", email);
                    account.locked = true;
                    return Ok(SignInResult::LockedOut);
                }
                return Ok(SignInResult::Failed);
            }

            account.failed_attempts = 0;
            if account.status != UserStatus::Confirmed {
                return Ok(SignInResult::NotAllowed);
            }
        }

        let session = self.sessions.issue(&normalize(email), remember, ()).await?;
        Ok(SignInResult::Succeeded(session))
    }

    async fn resolve_session(&self, session_id: &str) -> Result<Option<Session>, ProviderError> {
        Ok(self.sessions.resolve(session_id).await)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError> {
        self.sessions.revoke(&session.id).await;
        tracing::debug!("Signed out {}", session.email);
        Ok(())
    }
}
