//! HTTP API handlers for vidsight-ai

pub mod analyze;
pub mod health;
pub mod progress;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use progress::progress_routes;
