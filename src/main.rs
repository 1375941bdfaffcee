// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, sync::Arc, time::Duration};

use backoffice_auth_server::{
    api::router,
    auth::{password::hash_password, Identity, InMemoryIdentityStore},
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seed account created at startup (development convenience).
const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let addr = config.socket_addr()?;
    info!(
        environment = %config.environment,
        token_validity_ms = config.token_validity.num_milliseconds(),
        "Loaded configuration"
    );

    let directory = InMemoryIdentityStore::new();
    if let (Ok(email), Ok(password)) = (
        env::var(SEED_ADMIN_EMAIL_ENV),
        env::var(SEED_ADMIN_PASSWORD_ENV),
    ) {
        directory.insert(Identity::new(&email, hash_password(&password)?, "admin", true)?);
        info!(identity = %email, "Seeded admin identity");
    }
    if directory.is_empty() {
        warn!("Identity directory is empty; every login will be rejected");
    }

    let state = AppState::new(config, Arc::new(directory));
    let app = router(state);

    let shutdown = CancellationToken::new();
    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    info!(%addr, "Backoffice auth server listening (docs at /docs)");
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Wait for Ctrl+C or SIGTERM, then cancel `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown"),
    }

    shutdown.cancel();
}
