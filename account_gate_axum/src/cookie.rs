use account_gate::Session;
use http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE};

use crate::config::SESSION_COOKIE_NAME;
use crate::error::IntoResponseError;

fn session_cookie(name: &str, session: &Session) -> String {
    let cookie = format!("{name}={}; SameSite=Lax; Secure; HttpOnly; Path=/", session.id);
    // Without the remember flag the cookie ends with the browsing session
    if session.remember {
        format!("{cookie}; Max-Age={}", session.remaining_secs())
    } else {
        cookie
    }
}

fn expired_cookie(name: &str) -> String {
    format!("{name}=; SameSite=Lax; Secure; HttpOnly; Path=/; Max-Age=0")
}

/// `Set-Cookie` headers persisting a freshly issued session
pub(crate) fn set_session_cookie(
    headers: &mut HeaderMap,
    session: &Session,
) -> Result<(), (StatusCode, String)> {
    let value = HeaderValue::from_str(&session_cookie(&SESSION_COOKIE_NAME, session))
        .map_err(http::Error::from)
        .into_response_error()?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

/// `Set-Cookie` headers removing the session cookie
pub(crate) fn clear_session_cookie(headers: &mut HeaderMap) -> Result<(), (StatusCode, String)> {
    let value = HeaderValue::from_str(&expired_cookie(&SESSION_COOKIE_NAME))
        .map_err(http::Error::from)
        .into_response_error()?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
