// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 token encoding and decoding.
//!
//! ## Expiry tolerance
//!
//! [`TokenCodec::decode`] succeeds for any correctly signed, well-formed
//! token, including expired ones. The verifier's expiry signal is caught and
//! the claims are recovered with expiry validation switched off. Whether an
//! expired token is still usable is decided by
//! [`TokenPolicy`](super::policy::TokenPolicy).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde_json::{Map, Value};

use super::{claims::ClaimSet, error::TokenError};
use crate::config::SigningSecret;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Result of decoding a token along with its expiry state.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub claims: ClaimSet,
    /// `exp` is at or before the time of decoding
    pub expired: bool,
}

/// Signs and verifies tokens with a key derived from the configured secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    strict: Validation,
    lenient: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut strict = Validation::new(ALGORITHM);
        strict.leeway = 0;
        strict.validate_aud = false;
        strict.set_required_spec_claims(&["exp", "sub"]);

        let mut lenient = strict.clone();
        lenient.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            strict,
            lenient,
        }
    }

    /// Issue a token for `subject` valid for `validity` from now.
    ///
    /// A zero or negative `validity` yields a token that is already expired.
    pub fn generate(
        &self,
        subject: &str,
        extra: Map<String, Value>,
        validity: Duration,
    ) -> Result<String, TokenError> {
        let issued_at = Utc::now();
        let expires_at = expiry_for(issued_at, validity)
            .ok_or_else(|| TokenError::Encoding("validity out of range".to_string()))?;

        let claims = ClaimSet::new(subject, issued_at, expires_at, extra);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature and structure and report whether the token expired.
    pub fn inspect(&self, token: &str) -> Result<DecodedToken, TokenError> {
        match decode::<ClaimSet>(token, &self.decoding_key, &self.strict) {
            Ok(data) => {
                let expired = data.claims.is_expired_at(Utc::now());
                Ok(DecodedToken {
                    claims: data.claims,
                    expired,
                })
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                let data = decode::<ClaimSet>(token, &self.decoding_key, &self.lenient)
                    .map_err(TokenError::from_jwt)?;
                Ok(DecodedToken {
                    claims: data.claims,
                    expired: true,
                })
            }
            Err(e) => Err(TokenError::from_jwt(e)),
        }
    }

    /// Verify a token and return its claims regardless of expiry.
    pub fn decode(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.inspect(token).map(|decoded| decoded.claims)
    }

    /// Subject of a correctly signed token, expired or not.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }
}

/// `exp` for a token issued at `issued_at`.
///
/// `exp` is whole seconds. A positive validity is rounded up so the token is
/// never expired at issuance, even when the validity is under one second.
fn expiry_for(issued_at: DateTime<Utc>, validity: Duration) -> Option<DateTime<Utc>> {
    let expires_at = issued_at.checked_add_signed(validity)?;
    if validity <= Duration::zero() || expires_at.timestamp_subsec_nanos() == 0 {
        return Some(expires_at);
    }
    DateTime::from_timestamp(expires_at.timestamp().checked_add(1)?, 0)
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}
