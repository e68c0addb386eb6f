//! Row models mapping database tables onto core domain types.

pub mod catalog_item;
pub mod project;
