//! Common test utilities and fixtures.

#![cfg(feature = "server")]
#![allow(dead_code)]

use std::net::SocketAddr;

use axum_test::TestServer;
use tempfile::TempDir;

use filevault::server::{
    router, AppState, Config, LoggingConfig, ServerConfig, StoreConfig, UpstreamConfig,
    WorkerConfig,
};

/// A running application with fresh temporary storage.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _temp_dir: TempDir, // Keep alive for test duration
}

impl TestApp {
    /// Create a test application with no upstream configured.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_upstream(None)
    }

    /// Create a test application forwarding to the given upstream base URL.
    pub fn with_upstream(base_url: Option<String>) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = Config {
            server: ServerConfig {
                bind: "127.0.0.1".into(),
                port: 0,
            },
            upstream: UpstreamConfig { base_url },
            store: StoreConfig {
                path: temp_dir.path().join("store").to_string_lossy().into(),
                cache_path: temp_dir.path().join("cache").to_string_lossy().into(),
            },
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        };
        let state = AppState::from_config(&config)?;
        let server = TestServer::new(router(state.clone()))?;
        Ok(Self {
            server,
            state,
            _temp_dir: temp_dir,
        })
    }
}

/// Serve an axum router on an ephemeral local port, returning its address.
pub async fn spawn_upstream(app: axum::Router) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}
