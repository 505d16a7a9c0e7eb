// Presentation layer - HTTP handlers over the render service
pub mod app_state;
pub mod handlers;
