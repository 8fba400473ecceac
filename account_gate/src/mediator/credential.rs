use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PROVIDER_TIMEOUT;
use crate::provider::{
    ATTR_EMAIL, ATTR_NAME, IdentityProvider, IdentityResult, ProviderError, SignInResult,
};
use crate::session::SessionContext;

use super::errors::MediatorError;
use super::forms::{ConfirmForm, LoginForm, SignupForm};
use super::outcome::{Outcome, RedirectTarget};

/// Front controller between submitted account forms and the identity provider
///
/// Holds no per-request state; clones share the provider handle.
#[derive(Clone)]
pub struct CredentialMediator {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl CredentialMediator {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_timeout(provider, *PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(provider: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Run one provider call under the configured timeout
    async fn call<T, Fut>(&self, fut: Fut) -> Result<T, MediatorError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(MediatorError::from),
            Err(_) => Err(ProviderError::Timeout.into()),
        }
    }

    /// Resolve the session id presented by the caller into a session context
    ///
    /// Unknown ids and provider faults both yield an anonymous context.
    pub async fn session_context(&self, session_id: Option<&str>) -> SessionContext {
        let Some(session_id) = session_id else {
            return SessionContext::anonymous();
        };
        match self.call(self.provider.resolve_session(session_id)).await {
            Ok(Some(session)) => SessionContext::authenticated(session),
            Ok(None) => {
                tracing::debug!("Presented session is unknown or expired");
                SessionContext::anonymous()
            }
            Err(err) => {
                err.log();
                SessionContext::anonymous()
            }
        }
    }

    /// Register a new account and move on to the confirmation step
    #[tracing::instrument(skip_all)]
    pub async fn signup(&self, form: SignupForm) -> Outcome<SignupForm> {
        match self.try_signup(&form).await {
            Ok(target) => Outcome::Redirect(target),
            Err(err) => Outcome::redisplay(form, err),
        }
    }

    async fn try_signup(&self, form: &SignupForm) -> Result<RedirectTarget, MediatorError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(MediatorError::Validation(errors));
        }
        let email = form.email.trim();

        let mut user = self.call(self.provider.lookup_user(email)).await?;
        if user.exists() {
            return Err(MediatorError::UserExists);
        }

        user.attributes.add(ATTR_EMAIL, email)?;
        user.attributes.add(ATTR_NAME, email)?;
        let validation_data = user.attributes.clone();

        match self
            .call(
                self.provider
                    .create_user(&user, &form.password, &validation_data),
            )
            .await?
        {
            IdentityResult::Succeeded => {
                tracing::info!("Signup accepted for {}", email);
                Ok(RedirectTarget::Confirm {
                    email: email.to_string(),
                })
            }
            IdentityResult::Failed(errors) => Err(MediatorError::ProviderRejected(errors)),
        }
    }

    /// Submit a confirmation code, force-confirming the account on success
    #[tracing::instrument(skip_all)]
    pub async fn confirm(&self, form: ConfirmForm) -> Outcome<ConfirmForm> {
        match self.try_confirm(&form).await {
            Ok(target) => Outcome::Redirect(target),
            Err(err) => Outcome::redisplay(form, err),
        }
    }

    async fn try_confirm(&self, form: &ConfirmForm) -> Result<RedirectTarget, MediatorError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(MediatorError::Validation(errors));
        }
        let email = form.email.trim();

        let user = self
            .call(self.provider.find_user_by_email(email))
            .await?
            .ok_or(MediatorError::AccountNotFound)?;

        match self
            .call(self.provider.confirm_sign_up(&user, form.code.trim(), true))
            .await?
        {
            IdentityResult::Succeeded => {
                tracing::info!("Account confirmed for {}", email);
                Ok(RedirectTarget::Home)
            }
            IdentityResult::Failed(errors) => Err(MediatorError::ProviderRejected(errors)),
        }
    }

    /// Password sign-in without lockout on failure
    ///
    /// Every kind of failure yields the same `LoginError` entry so callers cannot
    /// tell a wrong password from an unknown account.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, form: LoginForm) -> Outcome<LoginForm> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Outcome::redisplay(form, MediatorError::Validation(errors));
        }

        let result = self
            .call(self.provider.password_sign_in(
                form.email.trim(),
                &form.password,
                form.remember_me,
                false,
            ))
            .await;

        match result {
            Ok(SignInResult::Succeeded(session)) => {
                tracing::info!("User signed in: {}", session.email);
                Outcome::SignedIn {
                    session,
                    target: RedirectTarget::Home,
                }
            }
            Ok(other) => {
                tracing::debug!("Sign-in refused: {:?}", other);
                Outcome::redisplay(form, MediatorError::CredentialMismatch)
            }
            Err(err) => Outcome::redisplay(form, err),
        }
    }

    /// End the caller's session if there is one; always lands on the login page
    #[tracing::instrument(skip_all)]
    pub async fn signout(&self, context: &SessionContext) -> RedirectTarget {
        if let Some(session) = context.session() {
            if let Err(err) = self.call(self.provider.sign_out(session)).await {
                err.log();
            } else {
                tracing::info!("User signed out: {}", session.email);
            }
        }
        RedirectTarget::Login
    }
}
