//! Test doubles shared by the unit tests

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use crate::provider::{
    Attributes, IdentityProvider, IdentityResult, ProviderError, ProviderUser, SignInResult,
    UserStatus,
};
use crate::session::Session;

/// A call received by [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    LookupUser(String),
    FindUserByEmail(String),
    CreateUser {
        user: ProviderUser,
        password: String,
        validation_data: Attributes,
    },
    ConfirmSignUp {
        email: String,
        code: String,
        force_confirm: bool,
    },
    PasswordSignIn {
        email: String,
        remember: bool,
        lockout_on_failure: bool,
    },
    SignOut(String),
}

/// Provider double with scripted answers that records every call
pub(crate) struct RecordingProvider {
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) existing_status: Option<UserStatus>,
    pub(crate) known_for_confirm: bool,
    pub(crate) create_result: IdentityResult,
    pub(crate) confirm_result: IdentityResult,
    pub(crate) sign_in_result: SignInResult,
    pub(crate) fail_with: Option<ProviderError>,
    pub(crate) delay: Option<StdDuration>,
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            existing_status: None,
            known_for_confirm: true,
            create_result: IdentityResult::Succeeded,
            confirm_result: IdentityResult::Succeeded,
            sign_in_result: SignInResult::Failed,
            fail_with: None,
            delay: None,
        }
    }
}

impl RecordingProvider {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    async fn record(&self, call: Call) -> Result<(), ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub(crate) fn test_session(email: &str, remember: bool) -> Session {
    Session {
        id: format!("session-{email}"),
        email: email.to_string(),
        remember,
        expires_at: Utc::now() + Duration::hours(1),
    }
}

#[async_trait]
impl IdentityProvider for RecordingProvider {
    async fn lookup_user(&self, email: &str) -> Result<ProviderUser, ProviderError> {
        self.record(Call::LookupUser(email.to_string())).await?;
        Ok(match &self.existing_status {
            Some(status) => ProviderUser::with_status(email, status.clone()),
            None => ProviderUser::new(email),
        })
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderUser>, ProviderError> {
        self.record(Call::FindUserByEmail(email.to_string())).await?;
        Ok(self
            .known_for_confirm
            .then(|| ProviderUser::with_status(email, UserStatus::Unconfirmed)))
    }

    async fn create_user(
        &self,
        user: &ProviderUser,
        password: &str,
        validation_data: &Attributes,
    ) -> Result<IdentityResult, ProviderError> {
        self.record(Call::CreateUser {
            user: user.clone(),
            password: password.to_string(),
            validation_data: validation_data.clone(),
        })
        .await?;
        Ok(self.create_result.clone())
    }

    async fn confirm_sign_up(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<IdentityResult, ProviderError> {
        self.record(Call::ConfirmSignUp {
            email: user.email.clone(),
            code: code.to_string(),
            force_confirm,
        })
        .await?;
        Ok(self.confirm_result.clone())
    }

    async fn password_sign_in(
        &self,
        email: &str,
        _password: &str,
        remember: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderError> {
        self.record(Call::PasswordSignIn {
            email: email.to_string(),
            remember,
            lockout_on_failure,
        })
        .await?;
        Ok(self.sign_in_result.clone())
    }

    async fn resolve_session(&self, _session_id: &str) -> Result<Option<Session>, ProviderError> {
        Ok(None)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError> {
        self.record(Call::SignOut(session.id.clone())).await
    }
}
