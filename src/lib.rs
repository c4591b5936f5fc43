pub mod config;
pub mod context;
pub mod format;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod services;
pub mod sources;

pub use config::AppConfig;
pub use context::DashboardContext;
pub use metrics::init_metrics;
