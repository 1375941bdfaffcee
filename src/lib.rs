// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backoffice Auth Server - bearer-token authentication and error envelope
//!
//! This crate verifies bearer tokens on incoming requests, resolves the
//! caller's identity and role, and renders every failure as one uniform JSON
//! error body.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and the middleware pipeline (Axum)
//! - `auth` - Token codec, validity rules, identity lookup, request filter
//! - `config` - Environment-driven configuration
//! - `error` - Error taxonomy and the error envelope translator
//! - `middleware` - Non-auth middleware (rate limiting slot)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;
