// Domain layer - Config records, formatting rules and datapoint handling
pub mod config_registry;
pub mod dashboard;
pub mod datapoint;
pub mod error;
pub mod format;
pub mod interval;
pub mod metric;
pub mod null_filter;
pub mod slug;
pub mod widget;
