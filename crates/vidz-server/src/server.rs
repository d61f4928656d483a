//! API server setup: shared state, router assembly, and the listen loop.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use vidz_core::config::VidzConfig;
use vidz_core::{JobController, JobRegistry};

use crate::routes;
use crate::sweeper;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<JobController>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(controller: Arc<JobController>) -> Self {
        Self {
            controller,
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all middleware and routes. Paths outside `/api`
/// fall through to `static_dir` when one is given.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = routes::create_router(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Run the HTTP service until Ctrl+C.
pub async fn serve(cfg: &VidzConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {:?}", cfg.bind_address))?;
    tokio::fs::create_dir_all(&cfg.output_dir)
        .await
        .with_context(|| format!("creating output directory {}", cfg.output_dir.display()))?;

    let registry = Arc::new(JobRegistry::new());
    let controller = Arc::new(JobController::from_config(cfg, Arc::clone(&registry)));
    let router = build_router(AppState::new(controller), cfg.static_dir.as_deref());

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(sweeper::run(
        registry,
        Duration::from_secs(cfg.job_ttl_secs),
        Duration::from_secs(cfg.sweep_interval_secs.max(1)),
        cancel.clone(),
    ));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    tracing::info!(
        output_dir = %cfg.output_dir.display(),
        engine = %cfg.ytdlp_path,
        "API server listening on http://{}",
        addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    cancel.cancel();
    let _ = sweeper.await;
    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("API server shutting down...");
}
