//! Query parameter types for API handlers.

use std::collections::BTreeSet;

use serde::Deserialize;
use studio_core::catalog::{CatalogKind, FilterState, SortBy, YearRange};
use studio_core::error::CoreError;

/// Catalog listing parameters.
///
/// Multi-select facets take comma-separated values, e.g.
/// `?styles=Modern,Brutalist&continents=Asia&sort=year&page=2`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub kind: Option<String>,
    pub climate: Option<String>,
    pub styles: Option<String>,
    #[serde(alias = "categories")]
    pub building_types: Option<String>,
    pub continents: Option<String>,
    pub tags: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    #[serde(alias = "search")]
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

impl CatalogQuery {
    /// Build the filter these parameters describe.
    pub fn into_filter(self) -> Result<FilterState, CoreError> {
        let mut filter = FilterState {
            kind: parse_kind(self.kind.as_deref())?,
            ..FilterState::default()
        };

        if let Some(climate) = non_blank(self.climate.as_deref()) {
            filter.toggle_climate(climate);
        }
        filter.selected_styles = split_list(self.styles.as_deref());
        filter.selected_building_types = split_list(self.building_types.as_deref());
        filter.selected_continents = split_list(self.continents.as_deref());
        filter.selected_tags = split_list(self.tags.as_deref());

        if self.year_min.is_some() || self.year_max.is_some() {
            let open = YearRange::unbounded();
            filter.set_year_range(
                self.year_min.unwrap_or(open.min),
                self.year_max.unwrap_or(open.max),
            );
        }
        if let Some(q) = self.q {
            filter.set_search_query(q);
        }
        if let Some(sort) = non_blank(self.sort.as_deref()) {
            filter.set_sort(SortBy::from_str_param(sort)?);
        }
        filter.set_page(self.page.unwrap_or(1));

        Ok(filter)
    }
}

/// Parameters for facet option counts.
#[derive(Debug, Default, Deserialize)]
pub struct FacetQuery {
    pub kind: Option<String>,
}

impl FacetQuery {
    pub fn kind(&self) -> Result<Option<CatalogKind>, CoreError> {
        parse_kind(self.kind.as_deref())
    }
}

fn parse_kind(raw: Option<&str>) -> Result<Option<CatalogKind>, CoreError> {
    non_blank(raw).map(CatalogKind::from_str_db).transpose()
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
