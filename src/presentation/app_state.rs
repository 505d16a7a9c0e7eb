// Application state for HTTP handlers
use crate::application::dashboard_store::DashboardStore;
use crate::application::render_service::RenderService;
use crate::domain::config_registry::ConfigRegistry;
use std::path::PathBuf;

pub struct AppState {
    pub render_service: RenderService,
    pub dashboards: DashboardStore,
    pub registry: ConfigRegistry,
    /// Re-read on reload.
    pub config_dir: PathBuf,
}
