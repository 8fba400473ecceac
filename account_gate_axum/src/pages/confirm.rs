use account_gate::{ACCOUNT_ROUTE_PREFIX, ConfirmForm, CredentialMediator, ModelError, Outcome};
use askama::Template;
use axum::{
    Form,
    extract::{Query, State, rejection::FormRejection},
    response::{Html, IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::error::IntoResponseError;

#[derive(Template)]
#[template(path = "confirm.html")]
struct ConfirmTemplate<'a> {
    route_prefix: &'a str,
    email: &'a str,
    code: &'a str,
    errors: &'a [ModelError],
}

#[derive(Deserialize)]
pub(super) struct ConfirmQuery {
    #[serde(rename = "Email")]
    email: Option<String>,
}

fn render(form: &ConfirmForm, errors: &[ModelError]) -> Result<Html<String>, (StatusCode, String)> {
    let template = ConfirmTemplate {
        route_prefix: ACCOUNT_ROUTE_PREFIX.as_str(),
        email: &form.email,
        code: &form.code,
        errors,
    };
    Ok(Html(template.render().into_response_error()?))
}

/// Confirmation form, prefilled with `?Email=` when coming from signup
pub(super) async fn confirm_page(
    Query(query): Query<ConfirmQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let form = ConfirmForm {
        email: query.email.unwrap_or_default(),
        code: String::new(),
    };
    render(&form, &[])
}

pub(super) async fn confirm(
    State(mediator): State<CredentialMediator>,
    form: Result<Form<ConfirmForm>, FormRejection>,
) -> Result<Response, (StatusCode, String)> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let errors = [super::unreadable_form(rejection)];
            return Ok(render(&ConfirmForm::default(), &errors)?.into_response());
        }
    };
    match mediator.confirm(form).await {
        Outcome::Redisplay { form, errors } => Ok(render(&form, &errors)?.into_response()),
        Outcome::Redirect(target) | Outcome::SignedIn { target, .. } => {
            super::found(&target, HeaderMap::new())
        }
    }
}
