//! account-gate - credential-issuance front controller
//!
//! Mediates signup, signup confirmation, password login and sign-out between
//! submitted forms and a hosted identity provider. The provider is the system of
//! record; nothing about an account is kept locally beyond sign-in sessions.

mod config;
mod mediator;
mod provider;
mod session;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{ACCOUNT_ROUTE_PREFIX, PROVIDER_TIMEOUT};

pub use mediator::{
    ConfirmForm, CredentialMediator, LoginForm, MediatorError, ModelError, Outcome,
    RedirectTarget, SignupForm,
};

pub use provider::{
    ATTR_EMAIL, ATTR_NAME, AttributeError, Attributes, AwsCredentials, CognitoConfig,
    CognitoIdentityProvider, IdentityError, IdentityProvider, IdentityResult,
    InMemoryIdentityProvider, ProviderError, ProviderUser, SignInResult, UserStatus,
    provider_from_env,
};

pub use session::{Session, SessionContext, SessionTable};
pub use utils::UtilError;
