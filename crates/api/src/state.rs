use std::sync::Arc;

use studio_core::controller::LifecycleController;
use studio_core::source::CatalogSource;

use crate::config::ServerConfig;
use crate::engagement::EngagementRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, absent when running on the demo dataset.
    pub pool: Option<studio_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Project lifecycle transitions and persistence.
    pub controller: Arc<LifecycleController>,
    /// Published showcase and portfolio items.
    pub catalog: Arc<dyn CatalogSource>,
    /// Per-client votes and comments.
    pub engagement: Arc<EngagementRegistry>,
}
