// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the backoffice API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with e-mail and password (`POST /v1/auth/login`)
//! 2. Server verifies the Argon2 hash and issues an HS256 token
//!    (`sub` = e-mail, `iat`, `exp`, extra claims)
//! 3. Client sends `Authorization: Bearer <token>` on every request
//! 4. The [`filter`] middleware:
//!    - Verifies the signature with the configured secret
//!    - Resolves the subject through the [`IdentityResolver`]
//!    - Attaches a [`Principal`] if the token is unexpired and matches
//! 5. Handlers use [`Auth`] / [`AdminOnly`] to require a principal
//!
//! ## Security
//!
//! - The token is the only session state; there is no server-side session
//! - A bad token never fails the request by itself, it just stays anonymous
//! - Expired tokens can be refreshed for 7 days after `exp`
//! - No clock skew leeway

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod identity;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;

pub use claims::ClaimSet;
pub use codec::{DecodedToken, TokenCodec};
pub use error::{AuthError, TokenError};
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use filter::{authenticate, AnonymousReason, FilterOutcome};
pub use identity::{Identity, IdentityError, IdentityResolver, InMemoryIdentityStore};
pub use policy::{TokenPolicy, TokenStatus};
pub use principal::Principal;
pub use roles::Role;
