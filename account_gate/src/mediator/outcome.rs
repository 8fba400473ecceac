use crate::session::Session;

use super::errors::{MediatorError, ModelError};

/// Where a successful operation sends the caller next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Confirmation step, prefilled with the email just registered
    Confirm { email: String },
    /// The host application's landing surface
    Home,
    Login,
}

impl RedirectTarget {
    /// Resolve to a `Location` value given the account route prefix and home URL
    pub fn location(&self, route_prefix: &str, home_url: &str) -> String {
        let prefix = route_prefix.trim_end_matches('/');
        match self {
            Self::Confirm { email } => {
                format!("{prefix}/Confirm?Email={}", urlencoding::encode(email))
            }
            Self::Home => home_url.to_string(),
            Self::Login => format!("{prefix}/Login"),
        }
    }
}

/// Result of an account operation on form `F`
#[derive(Debug, Clone)]
pub enum Outcome<F> {
    Redirect(RedirectTarget),
    /// Sign-in succeeded; the caller must persist the session before redirecting
    SignedIn {
        session: Session,
        target: RedirectTarget,
    },
    /// Show the submitted form again with errors attached
    Redisplay { form: F, errors: Vec<ModelError> },
}

impl<F> Outcome<F> {
    pub(crate) fn redisplay(form: F, err: MediatorError) -> Self {
        Self::Redisplay {
            form,
            errors: err.log().into_model_errors(),
        }
    }

    pub fn errors(&self) -> &[ModelError] {
        match self {
            Self::Redisplay { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn target(&self) -> Option<&RedirectTarget> {
        match self {
            Self::Redirect(target) | Self::SignedIn { target, .. } => Some(target),
            Self::Redisplay { .. } => None,
        }
    }
}
