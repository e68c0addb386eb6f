//! Route definitions for the `/catalog` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at `/catalog`.
///
/// ```text
/// GET    /                    -> list
/// GET    /facets/{facet}      -> facets
/// GET    /{id}/engagement     -> engagement
/// POST   /{id}/votes          -> vote
/// POST   /{id}/comments       -> comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list))
        .route("/facets/{facet}", get(catalog::facets))
        .route("/{id}/engagement", get(catalog::engagement))
        .route("/{id}/votes", post(catalog::vote))
        .route("/{id}/comments", post(catalog::comment))
}
