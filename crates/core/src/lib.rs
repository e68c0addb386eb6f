//! Domain core for the studio pipeline: project lifecycle, catalog view
//! model and the collaborator contracts they are built on.
//!
//! This crate has no database or HTTP dependencies so it can be shared by
//! the repository layer, the API server and tests.

pub mod catalog;
pub mod controller;
pub mod engagement;
pub mod error;
pub mod lifecycle;
pub mod project;
pub mod source;
pub mod types;
