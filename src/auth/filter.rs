// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request authentication filter.
//!
//! The filter never rejects a request. It either attaches a [`Principal`] to
//! the request extensions or lets the request through anonymously; access
//! decisions belong to the extractors in [`super::extractor`], including the
//! check that the principal's account is enabled.
//!
//! ## Flow
//!
//! 1. No `Authorization: Bearer <token>` header → anonymous
//! 2. Token signature/structure rejected → anonymous
//! 3. A principal is already attached → unchanged
//! 4. Subject not in the directory → anonymous
//! 5. Token expired or subject mismatch → anonymous
//! 6. Otherwise → principal attached

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::{
    identity::{IdentityError, IdentityResolver},
    policy::TokenPolicy,
    principal::Principal,
};
use crate::state::AppState;

/// Authorization scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Marks a request the filter has already processed.
#[derive(Debug, Clone, Copy)]
struct FilterApplied;

/// Why a request continues without a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousReason {
    /// No bearer credentials were presented
    NoCredentials,
    /// Token signature or structure was rejected
    MalformedToken,
    /// Token subject is not in the directory
    UnknownIdentity,
    /// Token is expired or issued for another identity
    TokenRejected,
}

/// Outcome of running the filter on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Authenticated(Principal),
    AlreadyAuthenticated,
    Anonymous(AnonymousReason),
}

/// Raw token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Decide how a request should proceed. Pure apart from the directory read.
pub fn evaluate(
    headers: &HeaderMap,
    extensions: &Extensions,
    tokens: &TokenPolicy,
    identities: &dyn IdentityResolver,
) -> FilterOutcome {
    let Some(token) = bearer_token(headers) else {
        return FilterOutcome::Anonymous(AnonymousReason::NoCredentials);
    };

    let subject = match tokens.codec().extract_subject(token) {
        Ok(subject) => subject,
        Err(e) => {
            tracing::warn!(error = %e, code = e.error_code(), "Rejected bearer token");
            return FilterOutcome::Anonymous(AnonymousReason::MalformedToken);
        }
    };

    if extensions.get::<Principal>().is_some() {
        return FilterOutcome::AlreadyAuthenticated;
    }

    let identity = match identities.load_by_key(&subject) {
        Ok(identity) => identity,
        Err(IdentityError::NotFound(_)) => {
            tracing::warn!(subject = %subject, "Token subject not found in directory");
            return FilterOutcome::Anonymous(AnonymousReason::UnknownIdentity);
        }
        Err(e) => {
            tracing::warn!(subject = %subject, error = %e, "Identity lookup failed");
            return FilterOutcome::Anonymous(AnonymousReason::UnknownIdentity);
        }
    };

    if !tokens.validate(token, &identity.key) {
        tracing::warn!(subject = %subject, "Token failed validation (expired or subject mismatch)");
        return FilterOutcome::Anonymous(AnonymousReason::TokenRejected);
    }

    FilterOutcome::Authenticated(Principal::from_identity(&identity))
}

/// Authentication middleware.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/v1/auth/me", get(me))
///     .layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));
/// ```
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<FilterApplied>().is_some() {
        return next.run(request).await;
    }
    request.extensions_mut().insert(FilterApplied);

    let outcome = evaluate(
        request.headers(),
        request.extensions(),
        &state.tokens,
        state.identities.as_ref(),
    );

    match outcome {
        FilterOutcome::Authenticated(principal) => {
            tracing::debug!(
                identity = %principal.identity_key,
                authorities = ?principal.authorities(),
                "Request authenticated"
            );
            request.extensions_mut().insert(principal);
        }
        FilterOutcome::AlreadyAuthenticated => {}
        FilterOutcome::Anonymous(reason) => {
            tracing::trace!(?reason, "Continuing anonymously");
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        codec::TokenCodec,
        identity::{Identity, InMemoryIdentityStore},
        Role,
    };
    use crate::config::SigningSecret;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use serde_json::Map;

    fn policy() -> TokenPolicy {
        let codec = TokenCodec::new(&SigningSecret::from_bytes(vec![0x42; 32]).unwrap());
        TokenPolicy::with_default_window(codec, Duration::minutes(10))
    }

    fn directory() -> InMemoryIdentityStore {
        InMemoryIdentityStore::new()
            .with_identity(Identity::new("ops@example.com", "hash", "manager", true).unwrap())
            .with_identity(Identity::new("gone@example.com", "hash", "staff", false).unwrap())
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn run(headers: &HeaderMap) -> FilterOutcome {
        evaluate(headers, &Extensions::new(), &policy(), &directory())
    }

    #[test]
    fn bearer_token_requires_prefix() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("bearer abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(
            run(&HeaderMap::new()),
            FilterOutcome::Anonymous(AnonymousReason::NoCredentials)
        );
    }

    #[test]
    fn garbage_token_is_anonymous() {
        assert_eq!(
            run(&headers_with("Bearer garbage")),
            FilterOutcome::Anonymous(AnonymousReason::MalformedToken)
        );
    }

    #[test]
    fn valid_token_authenticates() {
        let token = policy().issue("ops@example.com", Map::new()).unwrap();
        let outcome = run(&headers_with(&format!("Bearer {token}")));

        let FilterOutcome::Authenticated(principal) = outcome else {
            panic!("expected authenticated outcome, got {outcome:?}");
        };
        assert_eq!(principal.identity_key, "ops@example.com");
        assert!(principal.roles.contains(&Role::Manager));
    }

    #[test]
    fn unknown_subject_is_anonymous() {
        let token = policy().issue("ghost@example.com", Map::new()).unwrap();
        assert_eq!(
            run(&headers_with(&format!("Bearer {token}"))),
            FilterOutcome::Anonymous(AnonymousReason::UnknownIdentity)
        );
    }

    #[test]
    fn expired_token_is_anonymous() {
        let token = policy()
            .codec()
            .generate("ops@example.com", Map::new(), Duration::minutes(-1))
            .unwrap();
        assert_eq!(
            run(&headers_with(&format!("Bearer {token}"))),
            FilterOutcome::Anonymous(AnonymousReason::TokenRejected)
        );
    }

    #[test]
    fn disabled_identity_is_attached_as_disabled() {
        let token = policy().issue("gone@example.com", Map::new()).unwrap();
        let outcome = run(&headers_with(&format!("Bearer {token}")));

        let FilterOutcome::Authenticated(principal) = outcome else {
            panic!("expected authenticated outcome, got {outcome:?}");
        };
        assert_eq!(principal.identity_key, "gone@example.com");
        assert!(!principal.enabled);
    }

    #[test]
    fn existing_principal_is_left_alone() {
        let token = policy().issue("ops@example.com", Map::new()).unwrap();
        let mut extensions = Extensions::new();
        let existing = Identity::new("other@example.com", "hash", "staff", true).unwrap();
        extensions.insert(Principal::from_identity(&existing));

        let outcome = evaluate(
            &headers_with(&format!("Bearer {token}")),
            &extensions,
            &policy(),
            &directory(),
        );
        assert_eq!(outcome, FilterOutcome::AlreadyAuthenticated);
    }
}
