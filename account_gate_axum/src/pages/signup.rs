use account_gate::{ACCOUNT_ROUTE_PREFIX, CredentialMediator, ModelError, Outcome, SignupForm};
use askama::Template;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};

use crate::error::IntoResponseError;

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate<'a> {
    route_prefix: &'a str,
    email: &'a str,
    errors: &'a [ModelError],
}

fn render(form: &SignupForm, errors: &[ModelError]) -> Result<Html<String>, (StatusCode, String)> {
    let template = SignupTemplate {
        route_prefix: ACCOUNT_ROUTE_PREFIX.as_str(),
        email: &form.email,
        errors,
    };
    Ok(Html(template.render().into_response_error()?))
}

pub(super) async fn signup_page() -> Result<Html<String>, (StatusCode, String)> {
    render(&SignupForm::default(), &[])
}

pub(super) async fn signup(
    State(mediator): State<CredentialMediator>,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Response, (StatusCode, String)> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = [super::unreadable_form(rejection)];
            return Ok(render(&SignupForm::default(), &errors)?.into_response());
        }
    };
    match mediator.signup(form).await {
        Outcome::Redisplay { form, errors } => Ok(render(&form, &errors)?.into_response()),
        Outcome::Redirect(target) | Outcome::SignedIn { target, .. } => {
            super::found(&target, HeaderMap::new())
        }
    }
}
