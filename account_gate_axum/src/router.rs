//! Router for the account endpoints

use account_gate::CredentialMediator;
use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Create the router for the account endpoints
///
/// Mount it under `ACCOUNT_ROUTE_PREFIX`; the endpoints are then available at:
/// - {ACCOUNT_ROUTE_PREFIX}/Signup
/// - {ACCOUNT_ROUTE_PREFIX}/Confirm
/// - {ACCOUNT_ROUTE_PREFIX}/Login
/// - {ACCOUNT_ROUTE_PREFIX}/Signout
pub fn accounts_router(mediator: CredentialMediator) -> Router {
    accounts_router_no_trace(mediator).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as `accounts_router()` but without the HTTP tracing middleware
///
/// Use this if you want to add your own tracing middleware.
pub fn accounts_router_no_trace(mediator: CredentialMediator) -> Router {
    super::pages::router().with_state(mediator)
}
