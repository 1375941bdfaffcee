// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rate limiting slot.
//!
//! This is a pass-through. It holds the position in the middleware stack
//! (outside authentication, inside error translation) where a real limiter
//! plugs in, so swapping one in does not reorder the chain. A limiter that
//! rejects should return an [`ApiError`](crate::error::ApiError) so the
//! rejection is rendered as a normal error envelope.

use axum::{extract::Request, middleware::Next, response::Response};

/// No-op rate limiter.
pub async fn rate_limit(request: Request, next: Next) -> Response {
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn passes_every_request_through() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(rate_limit));

        for _ in 0..50 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
