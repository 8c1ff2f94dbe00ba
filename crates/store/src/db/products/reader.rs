//! Product aggregate reads.

use sqlx::PgPool;
use tracing::instrument;

use catalog_core::{Page, Product, ProductId, ShopId, clamp_limit};

use super::ProductRow;
use crate::db::{RepositoryError, translate_error};

/// Select list shared by every product read.
///
/// Images, variants and each variant's options are aggregated by correlated
/// sub-queries, so one round trip returns complete aggregates for every
/// selected product. Prices inside the documents are rendered as text to keep
/// their exact decimal value.
macro_rules! product_select {
    () => {
        r#"
        SELECT
            p.id, p.shop_id, p.category_id, c.name AS category_name,
            p.name, p.description, p.price, p.stock, p.min_stock,
            p.is_active, p.is_highlighted, p.is_promotional, p.promotional_price,
            p.created_at, p.updated_at,
            COALESCE((
                SELECT jsonb_agg(
                    jsonb_build_object('id', i.id, 'url', i.url)
                    ORDER BY i.position, i.id
                )
                FROM catalog.product_image i
                WHERE i.product_id = p.id
            ), '[]'::jsonb) AS images,
            COALESCE((
                SELECT jsonb_agg(
                    jsonb_build_object(
                        'id', v.id,
                        'name', v.name,
                        'order', v.display_order,
                        'selection_type', v.selection_type,
                        'max_selections', v.max_selections,
                        'options', COALESCE((
                            SELECT jsonb_agg(
                                jsonb_build_object(
                                    'id', o.id,
                                    'name', o.name,
                                    'price', o.price::text,
                                    'order', o.display_order
                                )
                                ORDER BY o.position, o.id
                            )
                            FROM catalog.variant_option o
                            WHERE o.variant_id = v.id
                        ), '[]'::jsonb)
                    )
                    ORDER BY v.position, v.id
                )
                FROM catalog.product_variant v
                WHERE v.product_id = p.id
            ), '[]'::jsonb) AS variants
        FROM catalog.product p
        JOIN catalog.category c ON c.id = p.category_id
        "#
    };
}

const GET_BY_ID_SQL: &str = concat!(product_select!(), "WHERE p.id = $1");

const LIST_BY_SHOP_SQL: &str = concat!(
    product_select!(),
    r"
        WHERE p.shop_id = $1
          AND ($2 = 0 OR p.id < $2)
        ORDER BY p.id DESC
        LIMIT $3
    "
);

/// Repository for product aggregate reads.
pub struct ProductReader<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductReader<'a> {
    /// Create a new product reader.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product with its images, variants and options.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (code `product_not_found`) if no
    /// product has this ID.
    /// Returns `RepositoryError::DataCorruption` if a child document cannot be decoded.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(GET_BY_ID_SQL)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| translate_error("get_product", e))?;

        let Some(row) = row else {
            return Err(RepositoryError::product_not_found(id.as_i32()));
        };

        Product::try_from(row)
    }

    /// List a shop's products, newest first, continuing after `cursor`.
    ///
    /// `cursor == 0` starts at the newest product; otherwise only products
    /// with an ID strictly below `cursor` are returned. `limit` is clamped to
    /// `1..=100`, with non-positive values meaning 20.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a child document cannot be decoded.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop_id = %shop_id))]
    pub async fn get_all_by_shop_id(
        &self,
        shop_id: ShopId,
        limit: i64,
        cursor: i32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(LIST_BY_SHOP_SQL)
            .bind(shop_id)
            .bind(cursor)
            .bind(clamp_limit(limit))
            .fetch_all(self.pool)
            .await
            .map_err(|e| translate_error("list_products_by_shop", e))?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List a shop's products as a page with its continuation cursor.
    ///
    /// # Errors
    ///
    /// Same as [`get_all_by_shop_id`](Self::get_all_by_shop_id).
    pub async fn list_page(
        &self,
        shop_id: ShopId,
        limit: i64,
        cursor: i32,
    ) -> Result<Page<Product>, RepositoryError> {
        let limit = clamp_limit(limit);
        let items = self.get_all_by_shop_id(shop_id, limit, cursor).await?;
        Ok(Page::from_items(items, limit))
    }
}
