//! account-gate-axum - axum routes and extractors for the account-gate mediator

mod config;
mod cookie;
mod error;
mod pages;
mod router;
mod session;

pub use config::{ACCOUNT_HOME_URL, SESSION_COOKIE_NAME};
pub use error::IntoResponseError;
pub use router::{accounts_router, accounts_router_no_trace};
pub use session::CurrentSession;

// Re-export the route prefix and the pieces needed to build a mediator
pub use account_gate::{
    ACCOUNT_ROUTE_PREFIX, CredentialMediator, IdentityProvider, InMemoryIdentityProvider,
    Session, SessionContext, provider_from_env,
};
