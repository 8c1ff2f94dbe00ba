//! Product aggregate persistence.
//!
//! A product and its images, variants and options are written by
//! [`ProductWriter`] inside one transaction and read back by
//! [`ProductReader`] with a single query that aggregates the children per
//! product row. Neither side issues one query per listed product.
//!
//! All queries are runtime-checked (`sqlx::query_as`) rather than macro
//! checked, since the aggregate queries build JSON documents whose shape is
//! verified by the decoder in `catalog_core::codec` instead.

mod reader;
mod writer;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use catalog_core::codec;
use catalog_core::{CategoryId, Product, ProductId, ShopId};

use super::RepositoryError;

pub use reader::ProductReader;
pub use writer::ProductWriter;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Full product row, with children aggregated into JSON arrays.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    shop_id: ShopId,
    category_id: CategoryId,
    category_name: String,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    min_stock: i32,
    is_active: bool,
    is_highlighted: bool,
    is_promotional: bool,
    promotional_price: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    images: serde_json::Value,
    variants: serde_json::Value,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let images = codec::decode_images(row.images).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;
        let variants = codec::decode_variants(row.variants).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            shop_id: row.shop_id,
            category_id: row.category_id,
            category_name: Some(row.category_name),
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            min_stock: row.min_stock,
            is_active: row.is_active,
            is_highlighted: row.is_highlighted,
            is_promotional: row.is_promotional,
            promotional_price: row.promotional_price,
            images,
            variants,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// Zero-based list index as stored in the `position` columns.
fn to_position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}
