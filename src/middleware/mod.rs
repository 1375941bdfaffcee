// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cross-cutting request middleware that is not part of authentication.

pub mod rate_limit;

pub use rate_limit::rate_limit;
