// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{IdentityResolver, TokenCodec, TokenPolicy};
use crate::config::AppConfig;
use crate::error::ErrorTranslator;

/// Shared, read-only request dependencies.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenPolicy>,
    pub identities: Arc<dyn IdentityResolver>,
    pub errors: ErrorTranslator,
}

impl AppState {
    pub fn new(config: AppConfig, identities: Arc<dyn IdentityResolver>) -> Self {
        let codec = TokenCodec::new(&config.signing_secret);
        let tokens = TokenPolicy::new(codec, config.token_validity, config.refresh_window);
        let errors = ErrorTranslator::new(config.environment.clone());

        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            identities,
            errors,
        }
    }
}
