//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod catalog_item_repo;
pub mod project_repo;

pub use catalog_item_repo::CatalogItemRepo;
pub use project_repo::ProjectRepo;
