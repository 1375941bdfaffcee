// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use super::identity::IdentityError;
use super::password::PasswordError;

/// Token encode/decode failures.
///
/// Expiry is not an error here: an expired but correctly signed token
/// still decodes. See [`super::codec::DecodedToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Structure, encoding or claim types are invalid
    #[error("token is malformed: {0}")]
    Malformed(String),
    /// Signature does not match the configured secret
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Token could not be produced
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Encoding(_) => "token_encoding_failed",
        }
    }

    pub(super) fn from_jwt(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(error.to_string()),
        }
    }
}

/// Failures of the login and refresh flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown identity or wrong password; callers must not learn which
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Identity exists but is not active
    #[error("account is disabled")]
    AccountDisabled,
    /// Token expired longer ago than the refresh grace window
    #[error("token is too old to be refreshed")]
    RefreshWindowElapsed,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::RefreshWindowElapsed => "refresh_window_elapsed",
            AuthError::Token(e) => e.error_code(),
            AuthError::Identity(_) => "identity_error",
            AuthError::Password(_) => "password_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(TokenError::InvalidSignature.error_code(), "invalid_signature");
        assert_eq!(
            AuthError::Token(TokenError::Malformed("x".into())).error_code(),
            "malformed_token"
        );
        assert_eq!(AuthError::InvalidCredentials.error_code(), "invalid_credentials");
    }

    #[test]
    fn credentials_message_does_not_leak_cause() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
    }
}
