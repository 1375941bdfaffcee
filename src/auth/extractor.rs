// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated principal.
//!
//! The [`filter`](super::filter) middleware does the token work; these
//! extractors only read what it attached and turn a missing or insufficient
//! principal into an error.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is Principal
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{Principal, Role};
use crate::error::ApiError;

/// Requires an authenticated principal.
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            ApiError::Authentication(
                "Full authentication is required to access this resource".to_string(),
            )
        })?;
        if !principal.enabled {
            tracing::warn!(identity = %principal.identity_key, "Request from disabled account");
            return Err(ApiError::Authentication("account is disabled".to_string()));
        }
        Ok(Auth(principal))
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub Principal);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;
        require_role(&principal, Role::Admin)?;
        Ok(AdminOnly(principal))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` for anonymous requests and disabled accounts instead of
/// rejecting.
pub struct OptionalAuth(pub Option<Principal>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(
            parts
                .extensions
                .get::<Principal>()
                .filter(|principal| principal.enabled)
                .cloned(),
        ))
    }
}

/// Reject with access denied unless the principal holds `required`.
pub fn require_role(principal: &Principal, required: Role) -> Result<(), ApiError> {
    if principal.has_role(required) {
        Ok(())
    } else {
        tracing::warn!(
            identity = %principal.identity_key,
            required = %required,
            "Access denied"
        );
        Err(ApiError::AccessDenied(format!("{} role required", required)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Identity;
    use axum::http::Request;

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn principal(role: &str) -> Principal {
        Principal::from_identity(&Identity::new("user@example.com", "hash", role, true).unwrap())
    }

    fn disabled_principal() -> Principal {
        Principal::from_identity(&Identity::new("old@example.com", "hash", "admin", false).unwrap())
    }

    #[tokio::test]
    async fn auth_requires_principal() {
        let mut parts = parts();
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Authentication(_))));
    }

    #[tokio::test]
    async fn auth_reads_principal_from_extensions() {
        let mut parts = parts();
        parts.extensions.insert(principal("staff"));

        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.identity_key, "user@example.com");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let mut parts = parts();
        parts.extensions.insert(principal("manager"));

        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let mut parts = parts();
        parts.extensions.insert(principal("admin"));

        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_principal() {
        let mut parts = parts();
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn disabled_principal_is_rejected() {
        let mut parts = parts();
        parts.extensions.insert(disabled_principal());

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Authentication(_))));
        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Authentication(_))));
    }

    #[tokio::test]
    async fn optional_auth_hides_disabled_principal() {
        let mut parts = parts();
        parts.extensions.insert(disabled_principal());

        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn require_role_uses_hierarchy() {
        assert!(require_role(&principal("admin"), Role::Manager).is_ok());
        assert!(require_role(&principal("staff"), Role::Manager).is_err());
    }
}
