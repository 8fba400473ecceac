use std::convert::Infallible;

use account_gate::{CredentialMediator, SessionContext};
use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
};
use axum_extra::{TypedHeader, headers};
use http::request::Parts;

use crate::config::SESSION_COOKIE_NAME;

/// Session context of the caller, available as an Axum extractor
///
/// Reads the session cookie and resolves it through the identity provider.
/// A missing, unknown or expired session yields an anonymous context; this
/// extractor never rejects a request.
///
/// # Example
///
/// ```no_run
/// use account_gate_axum::{CredentialMediator, CurrentSession};
/// use axum::{Router, routing::get};
///
/// async fn home(CurrentSession(context): CurrentSession) -> String {
///     match context.session() {
///         Some(session) => format!("Hello, {}!", session.email),
///         None => "Hello, anonymous user".to_string(),
///     }
/// }
///
/// fn app(mediator: CredentialMediator) -> Router {
///     Router::new().route("/", get(home)).with_state(mediator)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

impl<S> FromRequestParts<S> for CurrentSession
where
    CredentialMediator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mediator = CredentialMediator::from_ref(state);

        let cookies: Option<TypedHeader<headers::Cookie>> = parts.extract().await.ok();
        let session_id = cookies
            .as_ref()
            .and_then(|TypedHeader(cookies)| cookies.get(SESSION_COOKIE_NAME.as_str()));

        Ok(Self(mediator.session_context(session_id).await))
    }
}
