use askama::Template;
use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
};

use account_gate_axum::{
    ACCOUNT_HOME_URL, ACCOUNT_ROUTE_PREFIX, CredentialMediator, CurrentSession,
    IntoResponseError, accounts_router, provider_from_env,
};

mod server;

use server::{init_tracing, spawn_http_server, spawn_https_server};

#[derive(Clone, FromRef)]
struct AppState {
    mediator: CredentialMediator,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    email: Option<&'a str>,
    route_prefix: &'a str,
}

async fn index(
    CurrentSession(context): CurrentSession,
) -> Result<Html<String>, (StatusCode, String)> {
    let template = IndexTemplate {
        email: context.session().map(|session| session.email.as_str()),
        route_prefix: ACCOUNT_ROUTE_PREFIX.as_str(),
    };
    Ok(Html(template.render().into_response_error()?))
}

fn port_from_env(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_accounts");

    // rustls needs a process-wide crypto provider before any TLS config is built
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mediator = CredentialMediator::new(provider_from_env()?);
    let state = AppState {
        mediator: mediator.clone(),
    };

    let app = Router::new()
        .route("/", get(|| async { Redirect::to(ACCOUNT_HOME_URL.as_str()) }))
        .route(ACCOUNT_HOME_URL.as_str(), get(index))
        .with_state(state)
        .nest(ACCOUNT_ROUTE_PREFIX.as_str(), accounts_router(mediator));

    let http = spawn_http_server(port_from_env("PORT", 3001), app.clone());
    let https = spawn_https_server(port_from_env("HTTPS_PORT", 3443), app).await?;

    match https {
        Some(https) => {
            let _ = tokio::join!(http, https);
        }
        None => {
            let _ = http.await;
        }
    }
    Ok(())
}
