//! Catalog Core - Shared types library.
//!
//! This crate provides the types used across the catalog components:
//! - `catalog-store` - `PostgreSQL` persistence for the product aggregate
//! - `catalog-cli` - Command-line tools for migrations, seeding and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including from tests that never touch a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs
//! - [`models`] - The product aggregate (product, images, variants, options)
//! - [`validation`] - Domain rules checked before the aggregate is written
//! - [`codec`] - JSON document format for sub-entities
//! - [`pagination`] - Cursor pagination calculator and limit clamping
//! - [`error`] - Domain error kinds shared by every layer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod error;
pub mod models;
pub mod pagination;
pub mod types;
pub mod validation;

pub use error::ErrorKind;
pub use models::*;
pub use pagination::{CursorPagination, Identifiable, Page, build_cursor_pagination, clamp_limit};
pub use types::*;
pub use validation::{ValidationError, ValidationErrors};
