// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AdminOnly;
use crate::error::ErrorEnvelope;
use crate::state::AppState;

/// Response for GET /v1/admin/status
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatusResponse {
    /// Active environment name
    pub environment: String,
    /// Whether 500 messages are redacted
    pub redacts_internal_errors: bool,
    /// Token validity in seconds
    pub token_validity_secs: i64,
    /// Refresh grace window in seconds
    pub refresh_window_secs: i64,
    /// Admin making the request
    pub requested_by: String,
}

/// Authentication settings as seen by the running service.
#[utoipa::path(
    get,
    path = "/v1/admin/status",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Service auth settings", body = AdminStatusResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 403, description = "Admin role required", body = ErrorEnvelope),
    )
)]
pub async fn status(
    AdminOnly(principal): AdminOnly,
    State(state): State<AppState>,
) -> Json<AdminStatusResponse> {
    let environment = state.errors.environment();
    Json(AdminStatusResponse {
        environment: environment.name().to_string(),
        redacts_internal_errors: environment.is_production(),
        token_validity_secs: state.tokens.token_validity().num_seconds(),
        refresh_window_secs: state.tokens.refresh_window().num_seconds(),
        requested_by: principal.identity_key,
    })
}
