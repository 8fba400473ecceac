use account_gate::CredentialMediator;
use axum::{extract::State, response::Response};
use http::{HeaderMap, StatusCode};

use crate::cookie::clear_session_cookie;
use crate::session::CurrentSession;

/// Ends the caller's session, if any, and always redirects to the login page
pub(super) async fn signout(
    State(mediator): State<CredentialMediator>,
    CurrentSession(context): CurrentSession,
) -> Result<Response, (StatusCode, String)> {
    let target = mediator.signout(&context).await;

    let mut headers = HeaderMap::new();
    clear_session_cookie(&mut headers)?;
    super::found(&target, headers)
}
