// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated principal attached to a request.

use std::collections::BTreeSet;

use super::{identity::Identity, roles::Role};

/// The resolved identity of the caller.
///
/// Built per request by the authentication filter and stored in the request
/// extensions. Handlers read it through the [`Auth`](super::Auth) extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub identity_key: String,
    pub roles: BTreeSet<Role>,
    pub enabled: bool,
}

impl Principal {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            identity_key: identity.key.clone(),
            roles: BTreeSet::from([identity.role]),
            enabled: identity.active,
        }
    }

    /// Check if any held role grants the required privilege.
    pub fn has_role(&self, required: Role) -> bool {
        self.roles.iter().any(|role| role.has_privilege(required))
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Granted authorities, e.g. `["ROLE_MANAGER"]`.
    pub fn authorities(&self) -> Vec<&'static str> {
        self.roles.iter().map(Role::authority).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Identity {
        Identity::new("lead@example.com", "hash", "manager", true).unwrap()
    }

    #[test]
    fn from_identity_copies_key_role_and_state() {
        let principal = Principal::from_identity(&manager());
        assert_eq!(principal.identity_key, "lead@example.com");
        assert_eq!(principal.roles, BTreeSet::from([Role::Manager]));
        assert!(principal.enabled);
        assert_eq!(principal.authorities(), vec!["ROLE_MANAGER"]);
    }

    #[test]
    fn has_role_checks_privilege() {
        let principal = Principal::from_identity(&manager());
        assert!(principal.has_role(Role::Staff));
        assert!(principal.has_role(Role::Manager));
        assert!(!principal.has_role(Role::Admin));
        assert!(!principal.is_admin());
    }
}
