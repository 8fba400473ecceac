mod confirm;
mod login;
mod router;
mod signout;
mod signup;

use account_gate::{ACCOUNT_ROUTE_PREFIX, ModelError, RedirectTarget};
use axum::extract::rejection::FormRejection;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION};

use crate::config::ACCOUNT_HOME_URL;
use crate::error::IntoResponseError;

pub(crate) use router::router;

/// Error entry for a submission that could not be bound to its form
fn unreadable_form(rejection: FormRejection) -> ModelError {
    tracing::info!("Form binding failed: {}", rejection.body_text());
    ModelError::new("Form", "The submitted form could not be read.")
}

/// `302 Found` to the resolved target, carrying any extra headers
fn found(
    target: &RedirectTarget,
    mut headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    let location = target.location(ACCOUNT_ROUTE_PREFIX.as_str(), ACCOUNT_HOME_URL.as_str());
    tracing::debug!("Redirecting to {}", location);
    let value = HeaderValue::from_str(&location)
        .map_err(http::Error::from)
        .into_response_error()?;
    headers.insert(LOCATION, value);
    Ok((StatusCode::FOUND, headers).into_response())
}
