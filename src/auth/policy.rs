// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validity rules layered on [`TokenCodec`].
//!
//! None of these checks ever fail: every decode failure is classified into
//! a [`TokenStatus`] and each rule decides explicitly what that class means
//! for it.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use super::{codec::TokenCodec, error::AuthError, error::TokenError};
use crate::config::DEFAULT_REFRESH_WINDOW_DAYS;

/// Classification of a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Signed correctly and not yet expired
    Active,
    /// Signed correctly but past `exp`; claims remain readable
    Expired,
    /// Signature or structure rejected
    Malformed,
}

/// Stateless token rules.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    codec: TokenCodec,
    token_validity: Duration,
    refresh_window: Duration,
}

impl TokenPolicy {
    pub fn new(codec: TokenCodec, token_validity: Duration, refresh_window: Duration) -> Self {
        Self {
            codec,
            token_validity,
            refresh_window,
        }
    }

    /// Policy with the default seven day refresh window.
    pub fn with_default_window(codec: TokenCodec, token_validity: Duration) -> Self {
        Self::new(
            codec,
            token_validity,
            Duration::days(DEFAULT_REFRESH_WINDOW_DAYS),
        )
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn token_validity(&self) -> Duration {
        self.token_validity
    }

    pub fn refresh_window(&self) -> Duration {
        self.refresh_window
    }

    /// Issue a token with the configured validity.
    pub fn issue(&self, subject: &str, extra: Map<String, Value>) -> Result<String, TokenError> {
        self.codec.generate(subject, extra, self.token_validity)
    }

    pub fn status(&self, token: &str) -> TokenStatus {
        match self.codec.inspect(token) {
            Ok(decoded) if decoded.expired => TokenStatus::Expired,
            Ok(_) => TokenStatus::Active,
            Err(_) => TokenStatus::Malformed,
        }
    }

    /// `true` only for correctly signed tokens past `exp`.
    ///
    /// Malformed tokens report `false`: they are not "expired", they are
    /// invalid, and [`TokenPolicy::validate`] rejects them on its own.
    pub fn is_expired(&self, token: &str) -> bool {
        self.status(token) == TokenStatus::Expired
    }

    /// Whether the token expired no longer ago than the refresh window.
    /// Unexpired tokens are refreshable; malformed ones never are.
    pub fn can_refresh(&self, token: &str) -> bool {
        self.can_refresh_at(token, Utc::now())
    }

    pub fn can_refresh_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.codec.decode(token) {
            Ok(claims) => now.timestamp() - claims.exp <= self.refresh_window.num_seconds(),
            Err(_) => false,
        }
    }

    /// Token subject equals `expected_key` and the token is still active.
    pub fn validate(&self, token: &str, expected_key: &str) -> bool {
        match self.codec.inspect(token) {
            Ok(decoded) => !decoded.expired && decoded.claims.sub == expected_key,
            Err(_) => false,
        }
    }

    /// Re-issue a token for the same subject.
    ///
    /// Extra claims carry over from the old token; entries in `overrides`
    /// replace them.
    pub fn refresh(
        &self,
        token: &str,
        overrides: Map<String, Value>,
    ) -> Result<String, AuthError> {
        let claims = self.codec.decode(token)?;
        if !self.can_refresh(token) {
            return Err(AuthError::RefreshWindowElapsed);
        }
        let mut extra = claims.extra;
        extra.extend(overrides);
        Ok(self.issue(&claims.sub, extra)?)
    }
}
