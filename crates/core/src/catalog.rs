//! Catalog filter/sort/paginate view model.
//!
//! Showcase and portfolio pieces share one [`CatalogItem`] shape with a
//! [`CatalogKind`] discriminator. [`evaluate`] is a pure function of the
//! item list and the [`FilterState`]; the same inputs always produce the
//! same [`CatalogPage`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::RecordId;

/// Number of items shown per catalog page.
pub const PAGE_SIZE: usize = 6;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Which listing a catalog item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Showcase,
    Portfolio,
}

impl CatalogKind {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "showcase" => Ok(Self::Showcase),
            "portfolio" => Ok(Self::Portfolio),
            _ => Err(CoreError::Validation(format!(
                "Invalid catalog kind '{s}'. Must be one of: showcase, portfolio"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Showcase => "showcase",
            Self::Portfolio => "portfolio",
        }
    }
}

/// A published building in the showcase or the firm's portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: RecordId,
    pub kind: CatalogKind,
    pub name: String,
    pub description: String,
    pub climate: String,
    pub style: String,
    /// Building type, shown as "category" in the portfolio.
    pub building_type: String,
    pub continent: String,
    pub country: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub year: i32,
    pub approved: bool,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Sort order of the catalog listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Ascending by name.
    #[default]
    Name,
    /// Newest first.
    Year,
    /// Ascending by continent.
    Continent,
}

impl SortBy {
    pub fn from_str_param(s: &str) -> Result<Self, CoreError> {
        match s {
            "name" => Ok(Self::Name),
            "year" => Ok(Self::Year),
            "continent" => Ok(Self::Continent),
            _ => Err(CoreError::Validation(format!(
                "Invalid sort '{s}'. Must be one of: name, year, continent"
            ))),
        }
    }
}

/// Inclusive year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// A range that matches every year.
    pub fn unbounded() -> Self {
        Self {
            min: i32::MIN,
            max: i32::MAX,
        }
    }

    /// Smallest range covering every item's year; unbounded for an empty list.
    pub fn spanning(items: &[CatalogItem]) -> Self {
        let min = items.iter().map(|i| i.year).min();
        let max = items.iter().map(|i| i.year).max();
        match (min, max) {
            (Some(min), Some(max)) => Self { min, max },
            _ => Self::unbounded(),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Filter, sort and page selection for one catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub kind: Option<CatalogKind>,
    pub selected_climate: Option<String>,
    pub selected_styles: BTreeSet<String>,
    pub selected_building_types: BTreeSet<String>,
    pub selected_continents: BTreeSet<String>,
    pub selected_tags: BTreeSet<String>,
    pub selected_year_range: YearRange,
    pub search_query: String,
    pub sort_by: SortBy,
    /// 1-based.
    pub current_page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            kind: None,
            selected_climate: None,
            selected_styles: BTreeSet::new(),
            selected_building_types: BTreeSet::new(),
            selected_continents: BTreeSet::new(),
            selected_tags: BTreeSet::new(),
            selected_year_range: YearRange::unbounded(),
            search_query: String::new(),
            sort_by: SortBy::Name,
            current_page: 1,
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

impl FilterState {
    /// Select a climate, or clear it when the same climate is picked again.
    pub fn toggle_climate(&mut self, climate: &str) {
        if self.selected_climate.as_deref() == Some(climate) {
            self.selected_climate = None;
        } else {
            self.selected_climate = Some(climate.to_string());
        }
    }

    pub fn toggle_style(&mut self, style: &str) {
        toggle(&mut self.selected_styles, style);
    }

    pub fn toggle_building_type(&mut self, building_type: &str) {
        toggle(&mut self.selected_building_types, building_type);
    }

    pub fn toggle_continent(&mut self, continent: &str) {
        toggle(&mut self.selected_continents, continent);
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        toggle(&mut self.selected_tags, tag);
    }

    /// Set the year bounds. Reversed bounds are swapped.
    pub fn set_year_range(&mut self, a: i32, b: i32) {
        self.selected_year_range = YearRange {
            min: a.min(b),
            max: a.max(b),
        };
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    /// Request a page. Zero is treated as the first page.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Reset every filter back to "match everything".
    pub fn clear(&mut self) {
        *self = Self {
            kind: self.kind,
            ..Self::default()
        };
    }

    fn matches(&self, item: &CatalogItem, needle: &str) -> bool {
        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }
        if let Some(climate) = &self.selected_climate {
            if &item.climate != climate {
                return false;
            }
        }
        if !facet_allows(&self.selected_styles, &item.style)
            || !facet_allows(&self.selected_building_types, &item.building_type)
            || !facet_allows(&self.selected_continents, &item.continent)
        {
            return false;
        }
        if !self.selected_tags.is_empty() && self.selected_tags.is_disjoint(&item.tags) {
            return false;
        }
        if !self.selected_year_range.contains(item.year) {
            return false;
        }
        needle.is_empty()
            || item.name.to_lowercase().contains(needle)
            || item.description.to_lowercase().contains(needle)
    }
}

/// An empty selection is no constraint.
fn facet_allows(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// One page of filtered catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub total_matches: usize,
    pub total_pages: usize,
    /// The page actually returned, after clamping.
    pub current_page: usize,
    pub page_size: usize,
}

/// Filter, sort and paginate `items` with the default page size.
pub fn evaluate(items: &[CatalogItem], filter: &FilterState) -> CatalogPage {
    evaluate_with_page_size(items, filter, PAGE_SIZE)
}

/// Filter, sort and paginate `items`.
///
/// Only approved items are listed. Facets combine with AND, values within
/// a multi-select facet with OR. The requested page is clamped into
/// `1..=max(1, total_pages)`.
pub fn evaluate_with_page_size(
    items: &[CatalogItem],
    filter: &FilterState,
    page_size: usize,
) -> CatalogPage {
    let page_size = page_size.max(1);
    let needle = filter.search_query.to_lowercase();

    let mut matched: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| item.approved && filter.matches(item, &needle))
        .collect();

    // `sort_by` is stable, ties keep catalog order.
    match filter.sort_by {
        SortBy::Name => matched.sort_by(|a, b| a.name.cmp(&b.name)),
        SortBy::Year => matched.sort_by(|a, b| b.year.cmp(&a.year)),
        SortBy::Continent => matched.sort_by(|a, b| a.continent.cmp(&b.continent)),
    }

    let total_matches = matched.len();
    let total_pages = total_matches.div_ceil(page_size);
    let current_page = filter.current_page.clamp(1, total_pages.max(1));

    let start = (current_page - 1) * page_size;
    let page_items = matched
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    CatalogPage {
        items: page_items,
        total_matches,
        total_pages,
        current_page,
        page_size,
    }
}

// ---------------------------------------------------------------------------
// Facet counts
// ---------------------------------------------------------------------------

/// A facet the filter picker annotates with counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Climate,
    Style,
    BuildingType,
    Continent,
    Country,
    Tag,
}

impl Facet {
    pub fn from_str_param(s: &str) -> Result<Self, CoreError> {
        match s {
            "climate" => Ok(Self::Climate),
            "style" => Ok(Self::Style),
            "building_type" | "category" => Ok(Self::BuildingType),
            "continent" => Ok(Self::Continent),
            "country" => Ok(Self::Country),
            "tag" => Ok(Self::Tag),
            _ => Err(CoreError::Validation(format!(
                "Invalid facet '{s}'. Must be one of: climate, style, building_type, continent, country, tag"
            ))),
        }
    }

    fn values<'a>(&self, item: &'a CatalogItem) -> Vec<&'a str> {
        match self {
            Self::Climate => vec![item.climate.as_str()],
            Self::Style => vec![item.style.as_str()],
            Self::BuildingType => vec![item.building_type.as_str()],
            Self::Continent => vec![item.continent.as_str()],
            Self::Country => vec![item.country.as_str()],
            Self::Tag => item.tags.iter().map(String::as_str).collect(),
        }
    }
}

/// Count approved items per distinct value of `facet`, ignoring other filters.
pub fn facet_counts(items: &[CatalogItem], facet: Facet) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for item in items.iter().filter(|i| i.approved) {
        for value in facet.values(item) {
            if value.is_empty() {
                continue;
            }
            *counts.entry(value.to_string()).or_default() += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(id: &str, name: &str, style: &str, year: i32) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            kind: CatalogKind::Showcase,
            name: name.to_string(),
            description: format!("{style} building"),
            climate: "Temperate".to_string(),
            style: style.to_string(),
            building_type: "Residential".to_string(),
            continent: "Europe".to_string(),
            country: "Denmark".to_string(),
            tags: BTreeSet::new(),
            year,
            approved: true,
            image_url: None,
        }
    }

    fn fixture() -> Vec<CatalogItem> {
        let mut items = vec![
            item("1", "Fjord House", "Modern", 2019),
            item("2", "Atrium Library", "Minimalist", 2015),
            item("3", "Clay Court", "Vernacular", 2021),
            item("4", "Bamboo Pavilion", "Modern", 2021),
            item("5", "Glass Cube", "Minimalist", 2010),
        ];
        items[2].climate = "Arid".to_string();
        items[2].continent = "Africa".to_string();
        items[3].continent = "Asia".to_string();
        items[3].tags = ["sustainable", "timber"].iter().map(|s| s.to_string()).collect();
        items[0].tags = ["timber"].iter().map(|s| s.to_string()).collect();
        items[4].approved = false;
        items
    }

    fn ids(page: &CatalogPage) -> Vec<&str> {
        page.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn unapproved_items_never_listed() {
        let page = evaluate(&fixture(), &FilterState::default());
        assert_eq!(page.total_matches, 4);
        assert!(!ids(&page).contains(&"5"));
    }

    #[test]
    fn default_sort_is_name_ascending() {
        let page = evaluate(&fixture(), &FilterState::default());
        assert_eq!(ids(&page), vec!["2", "4", "3", "1"]);
    }

    #[test]
    fn year_sort_is_newest_first_and_stable() {
        let mut filter = FilterState::default();
        filter.set_sort(SortBy::Year);
        let page = evaluate(&fixture(), &filter);
        // 3 and 4 tie on 2021 and keep catalog order.
        assert_eq!(ids(&page), vec!["3", "4", "1", "2"]);
    }

    #[test]
    fn continent_sort_ascending() {
        let mut filter = FilterState::default();
        filter.set_sort(SortBy::Continent);
        let page = evaluate(&fixture(), &filter);
        assert_eq!(ids(&page), vec!["3", "4", "1", "2"]);
    }

    #[test]
    fn climate_toggle_selects_then_clears() {
        let mut filter = FilterState::default();
        filter.toggle_climate("Arid");
        assert_eq!(evaluate(&fixture(), &filter).total_matches, 1);
        filter.toggle_climate("Arid");
        assert_eq!(filter.selected_climate, None);
        assert_eq!(evaluate(&fixture(), &filter).total_matches, 4);
    }

    #[test]
    fn multi_select_values_combine_with_or() {
        let items = fixture();
        let mut filter = FilterState::default();
        filter.toggle_style("Modern");
        let c1 = evaluate(&items, &filter).total_matches;
        filter.toggle_style("Minimalist");
        let c2 = evaluate(&items, &filter).total_matches;
        assert_eq!(c1, 2);
        assert_eq!(c2, 3);
        assert!(c2 >= c1);
    }

    #[test]
    fn facets_combine_with_and() {
        let mut filter = FilterState::default();
        filter.toggle_style("Modern");
        filter.toggle_continent("Asia");
        let page = evaluate(&fixture(), &filter);
        assert_eq!(ids(&page), vec!["4"]);
    }

    #[test]
    fn empty_selection_matches_same_as_no_filter() {
        let items = fixture();
        let mut filter = FilterState::default();
        filter.toggle_tag("timber");
        filter.toggle_tag("timber");
        assert!(filter.selected_tags.is_empty());
        assert_eq!(evaluate(&items, &filter), evaluate(&items, &FilterState::default()));
    }

    #[test]
    fn tag_filter_matches_any_tag() {
        let mut filter = FilterState::default();
        filter.toggle_tag("timber");
        let page = evaluate(&fixture(), &filter);
        assert_eq!(ids(&page), vec!["4", "1"]);
    }

    #[test]
    fn year_range_is_inclusive() {
        let mut filter = FilterState::default();
        filter.set_year_range(2021, 2019);
        let page = evaluate(&fixture(), &filter);
        assert_eq!(page.total_matches, 3);
        assert!(!ids(&page).contains(&"2"));
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let mut filter = FilterState::default();
        filter.set_search_query("FJORD");
        assert_eq!(ids(&evaluate(&fixture(), &filter)), vec!["1"]);

        filter.set_search_query("vernacular");
        assert_eq!(ids(&evaluate(&fixture(), &filter)), vec!["3"]);
    }

    #[test]
    fn search_whitespace_is_part_of_the_needle() {
        let mut filter = FilterState::default();
        filter.set_search_query(" library");
        assert_eq!(ids(&evaluate(&fixture(), &filter)), vec!["2"]);

        filter.set_search_query(" fjord");
        assert!(evaluate(&fixture(), &filter).items.is_empty());

        filter.set_search_query("library ");
        assert!(evaluate(&fixture(), &filter).items.is_empty());
    }

    #[test]
    fn kind_filter_selects_listing() {
        let mut items = fixture();
        items[0].kind = CatalogKind::Portfolio;
        let filter = FilterState {
            kind: Some(CatalogKind::Portfolio),
            ..Default::default()
        };
        assert_eq!(ids(&evaluate(&items, &filter)), vec!["1"]);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let items = fixture();
        let mut filter = FilterState::default();
        filter.toggle_style("Modern");
        filter.set_sort(SortBy::Year);
        let first = serde_json::to_string(&evaluate(&items, &filter)).unwrap();
        let second = serde_json::to_string(&evaluate(&items, &filter)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn page_past_end_clamps_to_last_partial_page() {
        let items: Vec<CatalogItem> = (0..13)
            .map(|n| item(&format!("item-{n:02}"), &format!("Item {n:02}"), "Modern", 2000 + n))
            .collect();
        let mut filter = FilterState::default();
        filter.set_page(5);
        let page = evaluate(&items, &filter);
        assert_eq!(page.total_matches, 13);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(ids(&page), vec!["item-12"]);
    }

    #[test]
    fn empty_result_reports_page_one() {
        let mut filter = FilterState::default();
        filter.set_search_query("no such building");
        filter.set_page(4);
        let page = evaluate(&fixture(), &filter);
        assert_eq!(page.total_matches, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn clear_keeps_listing_kind() {
        let mut filter = FilterState {
            kind: Some(CatalogKind::Portfolio),
            ..Default::default()
        };
        filter.toggle_style("Modern");
        filter.set_search_query("house");
        filter.clear();
        assert_eq!(filter.kind, Some(CatalogKind::Portfolio));
        assert!(filter.selected_styles.is_empty());
        assert!(filter.search_query.is_empty());
    }

    #[test]
    fn facet_counts_ignore_other_filters_and_unapproved() {
        let counts = facet_counts(&fixture(), Facet::Style);
        assert_eq!(counts.get("Modern"), Some(&2));
        assert_eq!(counts.get("Minimalist"), Some(&1));
        assert_eq!(counts.get("Vernacular"), Some(&1));
    }

    #[test]
    fn tag_counts_count_each_tag() {
        let counts = facet_counts(&fixture(), Facet::Tag);
        assert_eq!(counts.get("timber"), Some(&2));
        assert_eq!(counts.get("sustainable"), Some(&1));
    }

    #[test]
    fn year_range_spans_items() {
        let range = YearRange::spanning(&fixture());
        assert_eq!(range, YearRange { min: 2010, max: 2021 });
        assert_eq!(YearRange::spanning(&[]), YearRange::unbounded());
    }

    #[test]
    fn facet_param_accepts_category_alias() {
        assert_eq!(Facet::from_str_param("category").unwrap(), Facet::BuildingType);
        assert!(Facet::from_str_param("colour").is_err());
    }
}
