//! filevault HTTP intercept server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tokio::signal;
use tower_http::trace::TraceLayer;

use filevault::cache::generation_name;
use filevault::server::{init_logging, router, AppState, Config};
use filevault::worker::InterceptWorker;

/// filevault intercept server.
#[derive(Parser, Debug)]
#[command(name = "filevault-server")]
#[command(about = "Offline share-queue and caching gateway for a personal file vault")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "filevault.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::from_file(&args.config)?;
    let bind_addr = config.bind_addr();

    // Initialize logging from config
    init_logging(&config.logging)?;

    // Create application state
    let state = AppState::from_config(&config)?;

    // Refresh the shell cache for this revision. A failed install keeps the
    // previous generation serving; the server still starts.
    refresh_shell_cache(&state, &config).await;

    // Build router with middleware
    let app: Router = router(state).layer(TraceLayer::new_for_http());

    // Parse bind address
    let addr: SocketAddr = bind_addr.parse()?;

    tracing::info!("Starting server on {}", addr);

    // Create the listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Install, activate, and prune the cache generation for the configured
/// revision tag by precaching the application shell from the upstream.
async fn refresh_shell_cache(state: &AppState, config: &Config) {
    let tag = &config.worker.version_tag;
    let shell_urls = &config.worker.shell_urls;

    if shell_urls.is_empty() {
        tracing::info!(tag = %tag, "no shell urls configured, skipping cache install");
        return;
    }
    let Some(upstream) = state.upstream.clone() else {
        tracing::info!(tag = %tag, "no upstream configured, keeping existing cache generation");
        return;
    };

    let mut worker = InterceptWorker::new(Arc::clone(&state.cache), tag);
    if worker.is_current_generation().unwrap_or(false) {
        tracing::info!(generation = %generation_name(tag), "cache generation already current");
        return;
    }

    let client = state.client.clone();
    let base = upstream.trim_end_matches('/').to_string();
    let fetch = move |url: String| {
        let client = client.clone();
        let base = base.clone();
        async move {
            let full = format!("{}{}", base, url);
            let response = client.get(&full).send().await.map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(|e| e.to_string())?.to_vec();
            Ok(filevault::cache::CachedResponse::new(status, headers, body))
        }
    };

    match worker.run(shell_urls, fetch).await {
        Ok(()) => {
            tracing::info!(generation = %generation_name(tag), "cache generation activated");
        }
        Err(e) => {
            // The staged generation was discarded; whatever was current
            // before keeps serving.
            tracing::warn!(error = %e, "shell cache install failed, previous generation stays");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
