// HTTP request handlers
use crate::infrastructure::config::load_catalog;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub const SHARED_URL_PREFIX: &str = "shared";

#[derive(Debug, Serialize)]
pub struct DashboardIndexEntry {
    pub name: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_url: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all dashboards
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<DashboardIndexEntry>> {
    let catalog = state.dashboards.snapshot();
    let entries = catalog
        .dashboards()
        .iter()
        .map(|d| DashboardIndexEntry {
            name: d.name.clone(),
            title: d.title.clone(),
            url: format!("/dashboards/{}", d.name),
            shared_url: d
                .share_id
                .as_ref()
                .map(|id| format!("/{}/{}", SHARED_URL_PREFIX, id)),
        })
        .collect();

    Json(entries)
}

/// Client config for a dashboard
pub async fn show_dashboard(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboards.snapshot().get(&name) {
        Some(dashboard) => Json(dashboard.client_config()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Client config for a dashboard reached through its share id
pub async fn show_shared_dashboard(
    Path(share_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboards.snapshot().get_shared(&share_id) {
        Some(dashboard) => Json(dashboard.client_config()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Render one widget's data
pub async fn render(
    Path((dashboard_name, widget_name)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let catalog = state.dashboards.snapshot();

    match state
        .render_service
        .handle_render_request(&catalog, &dashboard_name, &widget_name)
        .await
    {
        Ok(payload) => ([(header::CONTENT_TYPE, "application/json")], payload).into_response(),
        Err(e) => {
            tracing::error!("Error rendering {}/{}: {}", dashboard_name, widget_name, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Re-read the config dir and swap in the new dashboards
pub async fn reload(State(state): State<Arc<AppState>>) -> Response {
    let loader = Arc::clone(&state);
    let loaded =
        tokio::task::spawn_blocking(move || load_catalog(&loader.config_dir, &loader.registry)).await;

    match loaded {
        Ok(Ok(catalog)) => {
            let count = catalog.len();
            state.dashboards.replace(catalog);
            tracing::info!("Reloaded {} dashboard(s)", count);
            Json(json!({ "dashboards": count })).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Reload failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Reload task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
