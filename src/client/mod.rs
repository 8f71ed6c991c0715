//! MusicStream catalog API client module.

pub mod api;
pub mod models;

pub use api::{CatalogClient, CatalogError};
