pub mod catalog;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                             list, create
/// /projects/{id}                        get, update, delete
/// /projects/{id}/actions                lifecycle action (POST)
///
/// /catalog                              filtered listing (GET)
/// /catalog/facets/{facet}               facet option counts (GET)
/// /catalog/{id}/engagement              votes and comments (GET)
/// /catalog/{id}/votes                   vote (POST)
/// /catalog/{id}/comments                comment (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/catalog", catalog::router())
}
