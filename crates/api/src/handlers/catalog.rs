//! Handlers for the `/catalog` resource: filtered listing, facet counts,
//! and per-client votes and comments.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use studio_core::catalog::{evaluate, facet_counts, CatalogItem, CatalogPage, Facet, FilterState, YearRange};
use studio_core::engagement::ItemEngagement;
use studio_core::error::CoreError;
use studio_core::types::RecordId;
use validator::Validate;

use crate::engagement::EngagementChange;
use crate::error::{AppError, AppResult};
use crate::middleware::client::ClientId;
use crate::query::{CatalogQuery, FacetQuery};
use crate::response::DataResponse;
use crate::state::AppState;

/// One page of catalog results with the filter that produced it.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub data: CatalogPage,
    pub filter: FilterState,
    /// Year bounds spanned by the catalog, for the range picker.
    pub year_bounds: YearRange,
}

/// Engagement after a vote or comment request.
#[derive(Debug, Serialize)]
pub struct EngagementResponse {
    pub data: ItemEngagement,
    pub changed: bool,
}

impl From<EngagementChange> for EngagementResponse {
    fn from(change: EngagementChange) -> Self {
        Self {
            data: change.engagement,
            changed: change.changed,
        }
    }
}

/// Request body for `POST /catalog/{id}/comments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub text: String,
}

async fn load_items(state: &AppState) -> AppResult<Vec<CatalogItem>> {
    Ok(state.catalog.list_items().await.map_err(CoreError::from)?)
}

/// Engagement is only accepted for published items.
async fn ensure_item(state: &AppState, id: &str) -> AppResult<()> {
    let items = load_items(state).await?;
    if items.iter().any(|item| item.id == id && item.approved) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "CatalogItem",
            id: id.to_string(),
        }))
    }
}

/// GET /api/v1/catalog
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogResponse>> {
    let filter = query.into_filter()?;
    let items = load_items(&state).await?;
    let page = evaluate(&items, &filter);
    let published: Vec<CatalogItem> = items.into_iter().filter(|i| i.approved).collect();

    Ok(Json(CatalogResponse {
        data: page,
        filter,
        year_bounds: YearRange::spanning(&published),
    }))
}

/// GET /api/v1/catalog/facets/{facet}
pub async fn facets(
    State(state): State<AppState>,
    Path(facet): Path<String>,
    Query(query): Query<FacetQuery>,
) -> AppResult<Json<DataResponse<BTreeMap<String, usize>>>> {
    let facet = Facet::from_str_param(&facet)?;
    let kind = query.kind()?;
    let items: Vec<CatalogItem> = load_items(&state)
        .await?
        .into_iter()
        .filter(|item| kind.map_or(true, |k| item.kind == k))
        .collect();
    Ok(Json(DataResponse {
        data: facet_counts(&items, facet),
    }))
}

/// GET /api/v1/catalog/{id}/engagement
pub async fn engagement(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    client: ClientId,
) -> AppResult<Json<DataResponse<ItemEngagement>>> {
    ensure_item(&state, &id).await?;
    let data = state
        .engagement
        .snapshot(client.as_str(), &id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/catalog/{id}/votes
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    client: ClientId,
) -> AppResult<Json<EngagementResponse>> {
    ensure_item(&state, &id).await?;
    let change = state
        .engagement
        .vote(client.as_str(), &id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(change.into()))
}

/// POST /api/v1/catalog/{id}/comments
pub async fn comment(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    client: ClientId,
    Json(input): Json<CommentRequest>,
) -> AppResult<Json<EngagementResponse>> {
    input.validate()?;
    ensure_item(&state, &id).await?;
    let change = state
        .engagement
        .comment(client.as_str(), &id, &input.text)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(change.into()))
}
