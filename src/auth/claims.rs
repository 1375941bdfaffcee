// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claim set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim names owned by the codec. Callers cannot override them through
/// extra claims.
pub const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Decoded view of a token.
///
/// A `ClaimSet` can always be recovered from a correctly signed token, even
/// after `exp` has passed. Expiry is a policy question, not a decode one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject - the identity key (e-mail)
    pub sub: String,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Expiration (Unix seconds)
    pub exp: i64,

    /// Caller-supplied claims, flattened into the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClaimSet {
    /// Build a claim set, dropping any extra claim that collides with a
    /// reserved name.
    pub fn new(
        subject: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        extra: Map<String, Value>,
    ) -> Self {
        let extra = extra
            .into_iter()
            .filter(|(name, _)| !RESERVED_CLAIMS.contains(&name.as_str()))
            .collect();

        Self {
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Look up an extra claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Whether `exp` is at or before `now`. NumericDate is whole seconds, so a
    /// token issued with zero validity is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_claims() -> ClaimSet {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut extra = Map::new();
        extra.insert("tenant".to_string(), json!("acme"));
        ClaimSet::new("ops@example.com", now, now + Duration::hours(1), extra)
    }

    #[test]
    fn extra_claims_are_flattened_into_payload() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["sub"], "ops@example.com");
        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["exp"], 1_700_003_600);
        assert_eq!(json["tenant"], "acme");
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn reserved_names_cannot_be_overridden() {
        let now = Utc::now();
        let mut extra = Map::new();
        extra.insert("sub".to_string(), json!("intruder@example.com"));
        extra.insert("exp".to_string(), json!(i64::MAX));
        extra.insert("scope".to_string(), json!("reports"));

        let claims = ClaimSet::new("ops@example.com", now, now + Duration::minutes(5), extra);
        assert_eq!(claims.sub, "ops@example.com");
        assert_eq!(claims.extra.len(), 1);
        assert_eq!(claims.claim("scope"), Some(&json!("reports")));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let claims = sample_claims();
        let at_exp = DateTime::from_timestamp(claims.exp, 0).unwrap();
        assert!(claims.is_expired_at(at_exp));
        assert!(!claims.is_expired_at(at_exp - Duration::seconds(1)));
    }
}
