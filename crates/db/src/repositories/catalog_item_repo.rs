//! Repository for the `catalog_items` table.

use sqlx::PgPool;

use crate::models::catalog_item::CatalogItemRow;

const COLUMNS: &str = "id, kind, name, description, climate, style, building_type, \
     continent, country, tags, year, approved, image_url";

/// Read access to the published catalog.
pub struct CatalogItemRepo;

impl CatalogItemRepo {
    /// List every catalog item in insertion order.
    ///
    /// Approval is filtered by the view model, not here, so facet counts and
    /// listings apply the same rule.
    pub async fn list(pool: &PgPool) -> Result<Vec<CatalogItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM catalog_items ORDER BY created_at, id");
        sqlx::query_as::<_, CatalogItemRow>(&query)
            .fetch_all(pool)
            .await
    }
}
