//! Catalog item row model.

use sqlx::FromRow;
use studio_core::catalog::{CatalogItem, CatalogKind};
use studio_core::error::CoreError;

/// A row from the `catalog_items` table.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub description: String,
    pub climate: String,
    pub style: String,
    pub building_type: String,
    pub continent: String,
    pub country: String,
    pub tags: Vec<String>,
    pub year: i32,
    pub approved: bool,
    pub image_url: Option<String>,
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = CoreError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: row.id,
            kind: CatalogKind::from_str_db(&row.kind)?,
            name: row.name,
            description: row.description,
            climate: row.climate,
            style: row.style,
            building_type: row.building_type,
            continent: row.continent,
            country: row.country,
            tags: row.tags.into_iter().collect(),
            year: row.year,
            approved: row.approved,
            image_url: row.image_url,
        })
    }
}
