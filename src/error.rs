// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniform error envelope.
//!
//! Handlers return [`ApiError`]. Its `IntoResponse` impl stores the error in
//! the response extensions and the [`translate_errors`] middleware renders
//! it, so the request path and the production redaction rule are applied in
//! one place:
//!
//! ```json
//! {
//!   "timestamp": "2026-01-01T00:00:00Z",
//!   "status": 400,
//!   "error": "Bad Request",
//!   "message": "Validation failed",
//!   "path": "/v1/auth/login",
//!   "fieldErrors": { "email": "must be a well-formed email address" }
//! }
//! ```

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::auth::password::PasswordError;
use crate::auth::{AuthError, IdentityError, TokenError};
use crate::config::Environment;
use crate::state::AppState;

/// Field name → first violation message.
pub type FieldErrors = BTreeMap<String, String>;

pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";
pub const BAD_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated";
pub const ACCESS_DENIED_MESSAGE: &str = "You do not have permission to access this resource";
pub const REDACTED_INTERNAL_MESSAGE: &str = "An internal error occurred";
pub const DEFAULT_INTERNAL_MESSAGE: &str = "Unexpected error";

/// Every failure a request can surface, most specific first.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("bad credentials")]
    BadCredentials,
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    AccessDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{}", .0.as_deref().unwrap_or(DEFAULT_INTERNAL_MESSAGE))]
    Unclassified(Option<String>),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// Wrap any unexpected failure.
    pub fn internal(error: impl std::fmt::Display) -> Self {
        ApiError::Unclassified(Some(error.to_string()))
    }

    /// Server-side record of the failure. Unclassified errors are always
    /// logged in full, whatever the environment.
    fn log(&self) {
        match self {
            ApiError::Unclassified(_) => {
                tracing::error!(error = %self, details = ?self, "Unhandled error while processing request");
            }
            ApiError::Validation(fields) => {
                tracing::debug!(fields = ?fields, "Request validation failed");
            }
            other => tracing::debug!(error = %other, "Request rejected"),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::BadCredentials | ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, violations)| {
                let first = violations.first()?;
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", first.code));
                Some((field.to_string(), message))
            })
            .collect();
        ApiError::Validation(fields)
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Encoding(_) => ApiError::internal(error),
            other => ApiError::Authentication(other.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::NotFound(_) => ApiError::NotFound(error.to_string()),
            IdentityError::UnknownRole(_) => ApiError::internal(error),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(error: PasswordError) -> Self {
        ApiError::internal(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiError::BadCredentials,
            AuthError::AccountDisabled | AuthError::RefreshWindowElapsed => {
                ApiError::Authentication(error.to_string())
            }
            AuthError::Token(e) => e.into(),
            AuthError::Identity(e) => e.into(),
            AuthError::Password(e) => e.into(),
        }
    }
}

/// Carries an [`ApiError`] from a handler to [`translate_errors`].
#[derive(Debug, Clone)]
struct PendingError(ApiError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        // Rendered without a path and redacted; translate_errors replaces it
        // with the full envelope when installed.
        let mut response = ErrorTranslator::new(Environment::production()).render(&self, "");
        response.extensions_mut().insert(PendingError(self));
        response
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub timestamp: DateTime<Utc>,
    /// Numeric HTTP status
    pub status: u16,
    /// HTTP reason phrase
    pub error: String,
    pub message: String,
    pub path: String,
    /// Present only for validation failures
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

/// Maps errors to status codes and envelopes.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    environment: Environment,
}

impl ErrorTranslator {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn translate(&self, error: &ApiError, path: &str) -> (StatusCode, ErrorEnvelope) {
        let status = error.status_code();
        let path = normalize_path(path);

        let (message, field_errors) = match error {
            ApiError::Validation(fields) => {
                (VALIDATION_FAILED_MESSAGE.to_string(), Some(fields.clone()))
            }
            ApiError::InvalidArgument(message)
            | ApiError::NotFound(message)
            | ApiError::MethodNotAllowed(message) => (message.clone(), None),
            ApiError::BadCredentials => (BAD_CREDENTIALS_MESSAGE.to_string(), None),
            ApiError::Authentication(_) => (NOT_AUTHENTICATED_MESSAGE.to_string(), None),
            ApiError::AccessDenied(_) => (ACCESS_DENIED_MESSAGE.to_string(), None),
            ApiError::Unclassified(_) if self.environment.is_production() => {
                (REDACTED_INTERNAL_MESSAGE.to_string(), None)
            }
            ApiError::Unclassified(_) => (error.to_string(), None),
        };

        (status, envelope(status, message, path, field_errors))
    }

    pub fn render(&self, error: &ApiError, path: &str) -> Response {
        let (status, envelope) = self.translate(error, path);
        (status, Json(envelope)).into_response()
    }

    /// Re-render an error response built outside [`ApiError`] (for example
    /// by the router itself). Status and headers are kept, the body is
    /// replaced with an envelope whose message is the reason phrase.
    pub fn wrap(&self, response: Response, path: &str) -> Response {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("Unknown");
        let envelope = envelope(status, reason.to_string(), normalize_path(path), None);

        let mut rendered = (status, Json(envelope)).into_response();
        for (name, value) in response.headers() {
            if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                rendered.headers_mut().append(name.clone(), value.clone());
            }
        }
        rendered
    }
}

fn envelope(
    status: StatusCode,
    message: String,
    path: &str,
    field_errors: Option<FieldErrors>,
) -> ErrorEnvelope {
    ErrorEnvelope {
        timestamp: Utc::now(),
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Unknown").to_string(),
        message,
        path: path.to_string(),
        field_errors,
    }
}

/// Strip the `uri=` prefix some request descriptions carry.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix("uri=").unwrap_or(path)
}

/// Render any [`ApiError`] returned below this layer as an [`ErrorEnvelope`].
///
/// Error statuses that did not come from an [`ApiError`] are wrapped too, so
/// no 4xx/5xx leaves without an envelope.
pub async fn translate_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<PendingError>() {
        Some(PendingError(error)) => state.errors.render(&error, &path),
        None if is_error_status(response.status()) => {
            tracing::debug!(status = %response.status(), "Wrapping bare error response");
            state.errors.wrap(response, &path)
        }
        None => response,
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// JSON body extractor that also runs `validator` rules.
///
/// Unreadable bodies become [`ApiError::InvalidArgument`], rule violations
/// become [`ApiError::Validation`].
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::InvalidArgument(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
