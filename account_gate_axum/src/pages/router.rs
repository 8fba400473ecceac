use account_gate::CredentialMediator;
use axum::{Router, routing::get};

/// Create a router for the account pages
pub(crate) fn router() -> Router<CredentialMediator> {
    Router::new()
        .route(
            "/Signup",
            get(super::signup::signup_page).post(super::signup::signup),
        )
        .route(
            "/Confirm",
            get(super::confirm::confirm_page).post(super::confirm::confirm),
        )
        .route(
            "/Login",
            get(super::login::login_page).post(super::login::login),
        )
        .route(
            "/Signout",
            get(super::signout::signout).post(super::signout::signout),
        )
}
