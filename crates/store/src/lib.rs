//! Catalog Store - `PostgreSQL` persistence for the product aggregate.
//!
//! - [`db::ProductWriter`] creates and updates a product with its images,
//!   variants and options atomically.
//! - [`db::ProductReader`] loads single products and cursor-paginated shop
//!   listings without one query per product.
//! - [`error::AppError`] turns store failures into transport responses.
//!
//! The crate never installs a tracing subscriber; the embedding binary does.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;

pub use config::{CatalogConfig, ConfigError, PoolConfig};
pub use db::{ProductReader, ProductWriter, RepositoryError, create_pool, translate_error};
pub use error::AppError;
