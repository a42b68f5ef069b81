//! Router assembly: HTTP endpoints, bearer-token middleware, CORS, timeouts and HTTP tracing.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Json, Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, warn, Level};

use crate::error::Error;
use crate::protocol::ErrorDto;
use crate::state::AppState;

pub mod auth;
pub mod http;

pub const BASE_PATH: &str = "/kvs/v1";

/// Build the application router with:
/// - public topic listing and health under `/kvs/v1`
/// - session endpoints guarded by bearer-token introspection
/// - per-request timeout, answered as a 500 with the usual error body
/// - CORS (allow any origin/method/headers); adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let sessions = Router::new()
        .route("/:user_id/start_session", post(http::http_start_session))
        .route("/:user_id/:session_id/complete_session", post(http::http_complete_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::introspect_middleware));

    let api = Router::new()
        .route("/health", get(http::http_health))
        .route("/topics", get(http::http_get_topics))
        .merge(sessions);

    Router::new()
        .nest(BASE_PATH, api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

async fn handle_middleware_error(err: BoxError) -> Error {
    if err.is::<tower::timeout::error::Elapsed>() {
        Error::Internal("request deadline exceeded".into())
    } else {
        Error::Internal(format!("unhandled middleware error: {err}"))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(target: "kvs_quiz", %status, error = %self, "Request failed");
        } else {
            warn!(target: "kvs_quiz", %status, error = %self, "Request rejected");
        }
        let body = ErrorDto { status_code: status.as_u16(), err_msg: self.to_string() };
        (status, Json(body)).into_response()
    }
}
