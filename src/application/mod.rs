// Application layer - Render pipeline, dashboard catalog and backend seam
pub mod aggregation;
pub mod dashboard_store;
pub mod metrics_backend;
pub mod render_service;
