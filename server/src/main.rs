mod app;
mod config;
mod presenter;
mod routes;
mod services;
mod state;

use mappa_client::viewport::DEFAULT_TILE_SIZE;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::{AppState, Sources};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let controller_config = match config::controller_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid mode configuration");
            return;
        }
    };

    let (presenter, tile_requests) =
        match presenter::spawn(controller_config, config::command_buffer()) {
            Ok(spawned) => spawned,
            Err(e) => {
                tracing::error!(error = %e, "failed to start presentation thread");
                return;
            }
        };

    let state = AppState::new(
        presenter,
        Sources {
            data_path: config::data_path(),
            tile_dir: config::tile_dir(),
            tile_size: DEFAULT_TILE_SIZE,
            tile_fetch_concurrency: config::tile_fetch_concurrency(),
            texture_seed: config::texture_seed(),
        },
    );

    // Spawn background loaders
    tokio::spawn(services::data_loader::run(state.clone()));
    tokio::spawn(services::tile_loader::run(state.clone(), tile_requests));

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::SERVER_PORT);
    tracing::info!(
        width = controller_config.width,
        height = controller_config.height,
        "Mappa server listening on {addr}"
    );

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
