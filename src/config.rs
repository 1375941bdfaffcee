// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines the environment variables read at startup and the
//! immutable [`AppConfig`] built from them. Configuration is loaded once in
//! `main.rs` and shared read-only through `AppState`.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Base64 HMAC signing secret (at least 32 decoded bytes) | Required |
//! | `JWT_EXPIRATION_MS` | Token validity in milliseconds | `86400000` |
//! | `APP_ENV` | Active environment name (`prod` redacts 500 messages) | `dev` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{fmt, net::SocketAddr};

use base64ct::{Base64, Encoding};
use chrono::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRATION_ENV: &str = "JWT_EXPIRATION_MS";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_VALIDITY_MS: i64 = 24 * 60 * 60 * 1000;

/// Environment name that switches on production error redaction.
pub const PRODUCTION_ENV_NAME: &str = "prod";

/// HS256 keys shorter than the hash output are rejected.
pub const MIN_SECRET_BYTES: usize = 32;

/// Grace window after expiry during which a token may still be refreshed.
pub const DEFAULT_REFRESH_WINDOW_DAYS: i64 = 7;

/// Configuration errors raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// HMAC signing secret.
///
/// Decoded once at startup and never mutated afterwards. The raw bytes are
/// never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Decode a standard-alphabet base64 secret.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = Base64::decode_vec(encoded.trim()).map_err(|e| ConfigError::Invalid {
            var: JWT_SECRET_ENV,
            reason: format!("not valid base64: {e}"),
        })?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw key bytes, enforcing the minimum key length.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                var: JWT_SECRET_ENV,
                reason: format!(
                    "decoded secret is {} bytes, at least {MIN_SECRET_BYTES} required",
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Active deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn production() -> Self {
        Self::new(PRODUCTION_ENV_NAME)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Only the exact literal `prod` counts as production.
    pub fn is_production(&self) -> bool {
        self.0 == PRODUCTION_ENV_NAME
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("dev")
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                reason: format!("unknown format '{other}' (expected 'json' or 'pretty')"),
            }),
        }
    }
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub signing_secret: SigningSecret,
    pub token_validity: Duration,
    pub refresh_window: Duration,
    pub environment: Environment,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let signing_secret = lookup(JWT_SECRET_ENV)
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))
            .and_then(|raw| SigningSecret::from_base64(&raw))?;

        let validity_ms = match lookup(JWT_EXPIRATION_ENV) {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                var: JWT_EXPIRATION_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_TOKEN_VALIDITY_MS,
        };
        if validity_ms <= 0 {
            return Err(ConfigError::Invalid {
                var: JWT_EXPIRATION_ENV,
                reason: "token validity must be positive".to_string(),
            });
        }

        let environment = lookup(APP_ENV_ENV)
            .map(|name| Environment::new(name.trim()))
            .unwrap_or_default();

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            signing_secret,
            token_validity: Duration::milliseconds(validity_ms),
            refresh_window: Duration::days(DEFAULT_REFRESH_WINDOW_DAYS),
            environment,
            log_format,
        })
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: HOST_ENV,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // 32 bytes of 'k', base64 encoded
    const SECRET_B64: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[(JWT_SECRET_ENV, SECRET_B64)])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_validity, Duration::hours(24));
        assert_eq!(config.refresh_window, Duration::days(7));
        assert_eq!(config.environment.name(), "dev");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.signing_secret.as_bytes(), &[b'k'; 32]);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing(JWT_SECRET_ENV))));
    }

    #[test]
    fn short_secret_is_rejected() {
        // "short" in base64
        let result = AppConfig::from_lookup(lookup_from(&[(JWT_SECRET_ENV, "c2hvcnQ=")]));
        assert!(matches!(result, Err(ConfigError::Invalid { var: JWT_SECRET_ENV, .. })));
    }

    #[test]
    fn non_positive_validity_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, SECRET_B64),
            (JWT_EXPIRATION_ENV, "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: JWT_EXPIRATION_ENV, .. })
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, SECRET_B64),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (JWT_EXPIRATION_ENV, "60000"),
            (APP_ENV_ENV, "prod"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.token_validity, Duration::minutes(1));
        assert!(config.environment.is_production());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn only_exact_prod_is_production() {
        assert!(Environment::new("prod").is_production());
        assert!(!Environment::new("production").is_production());
        assert!(!Environment::new("PROD").is_production());
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = SigningSecret::from_bytes(vec![7u8; 32]).unwrap();
        assert_eq!(format!("{secret:?}"), "SigningSecret(<redacted>)");
    }
}
