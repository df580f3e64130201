//! Turnstile JSON API Server

use std::{process, sync::Arc};

use salvo::prelude::*;
use thiserror::Error;
use tracing::{error, info, warn};

use turnstile_app::{
    clock::SystemClock,
    context::{AppContext, AppInitError},
    lifecycle::DrainOutcome,
};

use crate::{
    config::{ServerConfig, storage::StorageBackend},
    limiter::RateLimiter,
    observability::{Metrics, ObservabilityError, init_subscriber},
    router::PipelineOptions,
    state::State,
};

mod config;
mod errors;
mod extensions;
mod healthcheck;
mod limiter;
mod observability;
mod pipeline;
mod products;
mod responses;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;
mod tokens;
mod users;

/// Turnstile JSON API Server entry point
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        // --help and --version
        if !e.use_stderr() {
            e.exit();
        }

        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "the subscriber failed to install, so there is nowhere else to report"
        )]
        {
            eprintln!("Logging error: {init_error}");
        }

        process::exit(1);
    }

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(source) => {
            error!("{}", ObservabilityError::from(source));

            process::exit(1);
        }
    };

    let app = match build_app_context(&config).await {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let tasks = app.tasks.clone();

    let state = State::new(
        app,
        config.server.environment.clone(),
        config.storage.deadline(),
        metrics,
    );

    let limiter = Arc::new(RateLimiter::new(&config.limiter));
    let sweeper = limiter.spawn_sweeper(config.limiter.sweep_interval());

    let options = PipelineOptions {
        trusted_origins: config.cors.trusted_origins.clone(),
        trust_forwarded_for: config.limiter.trust_forwarded_for,
        slow_request_threshold_ms: config.logging.slow_request_threshold_ms,
    };

    let service = router::service(router::app_router(), state, limiter, &options);

    let addr = config.socket_addr();

    info!(
        addr = %addr,
        environment = %config.server.environment,
        "starting server"
    );

    let listener = TcpListener::new(addr).bind().await;

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.lifecycle.shutdown_grace();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(service).await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    info!(pending = tasks.pending(), "waiting for background tasks");

    match tasks.drain(config.lifecycle.drain_timeout()).await {
        DrainOutcome::Drained => info!("background tasks finished"),
        DrainOutcome::TimedOut { pending } => {
            warn!(pending, "background tasks still running at shutdown deadline");
        }
    }

    info!("server stopped");
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingDatabaseUrl,

    #[error(transparent)]
    App(#[from] AppInitError),
}

async fn build_app_context(config: &ServerConfig) -> Result<AppContext, StartupError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on exit");

            Ok(AppContext::memory(Arc::new(SystemClock)))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .database_url
                .as_deref()
                .ok_or(StartupError::MissingDatabaseUrl)?;

            Ok(AppContext::postgres(url, &config.database.pool_settings()).await?)
        }
    }
}
