// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    http::{Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authenticate, Role},
    error::{translate_errors, ApiError, ErrorEnvelope},
    middleware::rate_limit,
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/login", post(session::login))
        .route("/auth/refresh", post(session::refresh))
        .route("/auth/me", get(session::me))
        .route("/admin/status", get(admin::status))
        .with_state(state.clone());

    let routes = Router::new()
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    with_middleware(routes, state)
}

/// Wrap routes in the request pipeline.
///
/// Outermost first: CORS, request id, tracing, error translation, panic
/// capture, rate limiting, authentication.
pub fn with_middleware(routes: Router, state: AppState) -> Router {
    routes
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn(rate_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state, translate_errors))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No handler found for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{method} is not supported for {}", uri.path()))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::internal(format!("request handler panicked: {detail}")).into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        session::login,
        session::refresh,
        session::me,
        admin::status
    ),
    components(
        schemas(
            ErrorEnvelope,
            Role,
            health::HealthResponse,
            session::LoginRequest,
            session::RefreshRequest,
            session::TokenResponse,
            session::PrincipalResponse,
            admin::AdminStatusResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Auth", description = "Token issuance and the current principal"),
        (name = "Admin", description = "Administrative endpoints")
    )
)]
struct ApiDoc;
