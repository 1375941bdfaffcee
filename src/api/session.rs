// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, token refresh and current-principal endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{
    password::verify_password, Auth, AuthError, Identity, IdentityError, Principal, Role,
};
use crate::error::{ApiError, ErrorEnvelope, ValidatedJson};
use crate::state::AppState;

/// Request body for `POST /v1/auth/login`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a well-formed email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub password: String,
}

/// Request body for `POST /v1/auth/refresh`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub token: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Validity in seconds
    pub expires_in: i64,
}

/// Response for `GET /v1/auth/me`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalResponse {
    pub identity_key: String,
    pub roles: Vec<Role>,
    pub authorities: Vec<String>,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self {
            authorities: principal
                .authorities()
                .into_iter()
                .map(str::to_string)
                .collect(),
            roles: principal.roles.into_iter().collect(),
            identity_key: principal.identity_key,
        }
    }
}

/// Claims derived from the directory record, rebuilt on every issue.
fn identity_claims(identity: &Identity) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert("role".to_string(), json!(identity.role));
    extra
}

fn token_response(state: &AppState, token: String) -> TokenResponse {
    TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.token_validity().num_seconds(),
    }
}

/// Exchange e-mail and password for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed or invalid body", body = ErrorEnvelope),
        (status = 401, description = "Invalid credentials or disabled account", body = ErrorEnvelope),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let identity = match state.identities.load_by_key(&request.email) {
        Ok(identity) => identity,
        Err(IdentityError::NotFound(_)) => {
            tracing::info!("Login attempt for unknown identity");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&request.password, &identity.password_hash)? {
        tracing::info!(identity = %identity.key, "Login attempt with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }
    if !identity.active {
        return Err(AuthError::AccountDisabled.into());
    }

    let token = state.tokens.issue(&identity.key, identity_claims(&identity))?;

    tracing::info!(identity = %identity.key, role = %identity.role, "Issued access token");
    Ok(Json(token_response(&state, token)))
}

/// Exchange a recently expired (or still valid) token for a fresh one.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 400, description = "Malformed or invalid body", body = ErrorEnvelope),
        (status = 401, description = "Token invalid or outside the refresh window", body = ErrorEnvelope),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let subject = state.tokens.codec().extract_subject(&request.token)?;

    let identity = state.identities.load_by_key(&subject).map_err(|e| match e {
        IdentityError::NotFound(_) => ApiError::Authentication(e.to_string()),
        other => other.into(),
    })?;
    if !identity.active {
        return Err(AuthError::AccountDisabled.into());
    }

    let token = state.tokens.refresh(&request.token, identity_claims(&identity))?;

    tracing::info!(identity = %identity.key, "Refreshed access token");
    Ok(Json(token_response(&state, token)))
}

/// Get the current authenticated principal.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Principal information", body = PrincipalResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
    )
)]
pub async fn me(Auth(principal): Auth) -> Json<PrincipalResponse> {
    Json(principal.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_response_lists_roles_and_authorities() {
        let identity = Identity::new("lead@example.com", "hash", "manager", true).unwrap();
        let response = PrincipalResponse::from(Principal::from_identity(&identity));

        assert_eq!(response.identity_key, "lead@example.com");
        assert_eq!(response.roles, vec![Role::Manager]);
        assert_eq!(response.authorities, vec!["ROLE_MANAGER".to_string()]);
    }

    #[test]
    fn login_request_validation_reports_both_fields() {
        let request = LoginRequest {
            email: "nope".to_string(),
            password: String::new(),
        };
        let ApiError::Validation(fields) = ApiError::from(request.validate().unwrap_err()) else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["password"], "must not be blank");
    }
}
