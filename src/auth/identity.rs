// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity lookup contract and the in-memory reference directory.
//!
//! Identity keys are e-mail addresses. They are normalised (NFKC, trimmed,
//! lowercased) before any lookup so `Ops@Example.com` and `ops@example.com`
//! resolve to the same record.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use unicode_normalization::UnicodeNormalization;

use super::roles::Role;

/// Errors raised by an [`IdentityResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("no identity registered for '{0}'")]
    NotFound(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// A user directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Normalised identity key (e-mail)
    pub key: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
}

impl Identity {
    /// Build an identity from raw directory fields, validating the role name.
    pub fn new(
        key: &str,
        password_hash: impl Into<String>,
        role_name: &str,
        active: bool,
    ) -> Result<Self, IdentityError> {
        let role = Role::from_name(role_name)
            .ok_or_else(|| IdentityError::UnknownRole(role_name.to_string()))?;

        Ok(Self {
            key: normalize_key(key),
            password_hash: password_hash.into(),
            role,
            active,
        })
    }
}

/// Maps a verified subject to a full identity.
///
/// Implementations are shared across all in-flight requests and must be safe
/// for concurrent reads.
pub trait IdentityResolver: Send + Sync {
    fn load_by_key(&self, key: &str) -> Result<Identity, IdentityError>;
}

/// Canonical form of an identity key.
pub fn normalize_key(key: &str) -> String {
    key.trim().nfkc().collect::<String>().to_lowercase()
}

/// Read-mostly in-memory directory.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_identity(self, identity: Identity) -> Self {
        self.insert(identity);
        self
    }

    /// Insert or replace an identity.
    pub fn insert(&self, identity: Identity) {
        let mut identities = self
            .identities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        identities.insert(identity.key.clone(), identity);
    }

    pub fn len(&self) -> usize {
        self.identities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityResolver for InMemoryIdentityStore {
    fn load_by_key(&self, key: &str) -> Result<Identity, IdentityError> {
        let key = normalize_key(key);
        self.identities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or(IdentityError::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(key: &str, role: &str) -> Identity {
        Identity::new(key, "$argon2id$stub", role, true).unwrap()
    }

    #[test]
    fn unknown_role_is_rejected_at_the_boundary() {
        let result = Identity::new("ops@example.com", "hash", "superuser", true);
        assert_eq!(result, Err(IdentityError::UnknownRole("superuser".to_string())));
    }

    #[test]
    fn keys_are_normalised() {
        assert_eq!(normalize_key("  Ops@Example.COM "), "ops@example.com");
        // Fullwidth commercial at folds to ASCII under NFKC
        assert_eq!(normalize_key("ops\u{FF20}example.com"), "ops@example.com");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let store = InMemoryIdentityStore::new().with_identity(identity("Ops@Example.com", "admin"));

        let found = store.load_by_key("OPS@example.com").unwrap();
        assert_eq!(found.key, "ops@example.com");
        assert_eq!(found.role, Role::Admin);
    }

    #[test]
    fn missing_identity_is_not_found() {
        let store = InMemoryIdentityStore::new();
        assert!(store.is_empty());
        assert_eq!(
            store.load_by_key("ghost@example.com"),
            Err(IdentityError::NotFound("ghost@example.com".to_string()))
        );
    }

    #[test]
    fn insert_replaces_existing_record() {
        let store = InMemoryIdentityStore::new().with_identity(identity("ops@example.com", "staff"));
        store.insert(identity("ops@example.com", "manager"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.load_by_key("ops@example.com").unwrap().role, Role::Manager);
    }
}
