use account_gate::{
    ACCOUNT_ROUTE_PREFIX, CredentialMediator, LoginForm, ModelError, Outcome, RedirectTarget,
};
use askama::Template;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};

use crate::cookie::set_session_cookie;
use crate::error::IntoResponseError;
use crate::session::CurrentSession;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    route_prefix: &'a str,
    email: &'a str,
    remember_me: bool,
    errors: &'a [ModelError],
}

fn render(form: &LoginForm, errors: &[ModelError]) -> Result<Html<String>, (StatusCode, String)> {
    let template = LoginTemplate {
        route_prefix: ACCOUNT_ROUTE_PREFIX.as_str(),
        email: &form.email,
        remember_me: form.remember_me,
        errors,
    };
    Ok(Html(template.render().into_response_error()?))
}

pub(super) async fn login_page(
    CurrentSession(context): CurrentSession,
) -> Result<Response, (StatusCode, String)> {
    if context.is_authenticated() {
        return super::found(&RedirectTarget::Home, HeaderMap::new());
    }
    Ok(render(&LoginForm::default(), &[])?.into_response())
}

pub(super) async fn login(
    State(mediator): State<CredentialMediator>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, (StatusCode, String)> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = [super::unreadable_form(rejection)];
            return Ok(render(&LoginForm::default(), &errors)?.into_response());
        }
    };
    match mediator.login(form).await {
        Outcome::SignedIn { session, target } => {
            let mut headers = HeaderMap::new();
            set_session_cookie(&mut headers, &session)?;
            super::found(&target, headers)
        }
        Outcome::Redirect(target) => super::found(&target, HeaderMap::new()),
        Outcome::Redisplay { form, errors } => Ok(render(&form, &errors)?.into_response()),
    }
}
