// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{Router, routing::{get, post}};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_store::DashboardStore;
use crate::application::render_service::RenderService;
use crate::domain::config_registry::ConfigRegistry;
use crate::infrastructure::config::{load_catalog, load_settings};
use crate::infrastructure::graphite_backend::GraphiteBackend;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_dashboards, reload, render, show_dashboard, show_shared_dashboard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_settings()?;
    let registry = ConfigRegistry::builtin()?;
    let catalog = load_catalog(&settings.dashboards.config_dir, &registry)?;
    if catalog.is_empty() {
        tracing::warn!(
            "No dashboards loaded from {}",
            settings.dashboards.config_dir.display()
        );
    }

    // Create backend (infrastructure layer)
    let backend = Arc::new(GraphiteBackend::new(
        settings.backend.url.clone(),
        Duration::from_secs(settings.backend.timeout_secs),
    )?);

    // Create services (application layer)
    let render_service = RenderService::new(backend);

    // Create application state
    let state = Arc::new(AppState {
        render_service,
        dashboards: DashboardStore::new(catalog),
        registry,
        config_dir: settings.dashboards.config_dir.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:name", get(show_dashboard))
        .route("/shared/:share_id", get(show_shared_dashboard))
        .route("/render/:dashboard/:widget", get(render))
        .route("/reload", post(reload))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = settings.server.bind.parse()?;
    tracing::info!("Starting diamondash on {}, backend {}", addr, settings.backend.url);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
