//! Product aggregate writes.
//!
//! Both operations run inside one transaction and write in a fixed order:
//! product row, images, then each variant followed by its options. Work is
//! done on a staged copy of the aggregate, which replaces the caller's value
//! only after the commit succeeds.

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use tracing::instrument;

use catalog_core::models::resolve_order;
use catalog_core::{
    ImageId, OptionId, Product, ProductId, ProductImage, ShopId, Variant, VariantId, VariantOption,
};

use super::to_position;
use crate::db::{RepositoryError, translate_error};

/// Columns generated by the database when a product row is written.
#[derive(Debug, sqlx::FromRow)]
struct WrittenProduct {
    id: ProductId,
    shop_id: ShopId,
    category_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WrittenProduct {
    fn apply(self, product: &mut Product) {
        product.id = self.id;
        product.shop_id = self.shop_id;
        product.category_name = self.category_name;
        product.created_at = Some(self.created_at);
        product.updated_at = Some(self.updated_at);
    }
}

/// Repository for product aggregate writes.
pub struct ProductWriter<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductWriter<'a> {
    /// Create a new product writer.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product with all of its images, variants and options.
    ///
    /// On success every ID in `product` is assigned, `shop_id` is set and
    /// unset display orders are resolved from list positions. On failure
    /// nothing is written and `product` is left untouched.
    ///
    /// Pass `conn` to run inside a caller-owned unit of work; the writes are
    /// then nested in a savepoint of that connection's transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the shop already has a product with this name.
    /// Returns `RepositoryError::BusinessRule` if the shop or category does not exist.
    /// Returns `RepositoryError::Validation` if a value violates a schema constraint.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, product, conn), fields(shop_id = %shop_id, name = %product.name))]
    pub async fn create(
        &self,
        product: &mut Product,
        shop_id: ShopId,
        conn: Option<&mut PgConnection>,
    ) -> Result<(), RepositoryError> {
        let mut draft = product.clone();
        draft.shop_id = shop_id;
        draft.resolve_display_orders();

        let mut tx = self.begin(conn).await?;
        if let Err(e) = insert_aggregate(&mut tx, &mut draft).await {
            return Err(rollback(tx, "create_product", e).await);
        }
        tx.commit()
            .await
            .map_err(|e| translate_error("create_product", e))?;

        tracing::info!(
            product_id = %draft.id,
            images = draft.images.len(),
            variants = draft.variants.len(),
            "Product created"
        );
        *product = draft;
        Ok(())
    }

    /// Replace a product's scalars and merge its children.
    ///
    /// Children in `product` with an ID are kept and updated in place; those
    /// without one are inserted. `new_images` are appended after the existing
    /// images. Children the product currently owns that are absent from the
    /// desired aggregate are deleted. Whether at least one image remains is
    /// not checked here.
    ///
    /// On success `product` holds the stored aggregate with all IDs assigned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::BusinessRule` if a kept child does not belong to the product,
    /// or the category does not exist.
    /// Returns `RepositoryError::Duplicate` if the new name is taken in the shop.
    /// Returns `RepositoryError::Validation` if a value violates a schema constraint.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, product, new_images, conn), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        product: &mut Product,
        new_images: Vec<ProductImage>,
        conn: Option<&mut PgConnection>,
    ) -> Result<(), RepositoryError> {
        let mut draft = product.clone();
        draft.id = id;
        draft
            .images
            .extend(new_images.into_iter().map(|image| ProductImage {
                id: ImageId::UNSAVED,
                ..image
            }));
        draft.resolve_display_orders();

        let mut tx = self.begin(conn).await?;
        if let Err(e) = merge_aggregate(&mut tx, &mut draft).await {
            return Err(rollback(tx, "update_product", e).await);
        }
        tx.commit()
            .await
            .map_err(|e| translate_error("update_product", e))?;

        tracing::info!(
            images = draft.images.len(),
            variants = draft.variants.len(),
            "Product updated"
        );
        *product = draft;
        Ok(())
    }

    /// Open a transaction, or a savepoint when the caller supplies a connection.
    async fn begin<'c>(
        &self,
        conn: Option<&'c mut PgConnection>,
    ) -> Result<Transaction<'c, Postgres>, RepositoryError> {
        let tx = match conn {
            Some(conn) => conn.begin().await,
            None => self.pool.begin().await,
        };
        tx.map_err(|e| translate_error("begin_transaction", e))
    }
}

/// Roll back after a failed write, keeping the original error.
async fn rollback(
    tx: Transaction<'_, Postgres>,
    operation: &'static str,
    err: RepositoryError,
) -> RepositoryError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(operation, error = %rollback_err, "Rollback failed");
    }
    err
}

// =============================================================================
// Create
// =============================================================================

async fn insert_aggregate(
    conn: &mut PgConnection,
    product: &mut Product,
) -> Result<(), RepositoryError> {
    let written = sqlx::query_as::<_, WrittenProduct>(
        r"
        INSERT INTO catalog.product AS p (
            shop_id, category_id, name, description, price, stock, min_stock,
            is_active, is_highlighted, is_promotional, promotional_price
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING p.id, p.shop_id, p.created_at, p.updated_at,
                  (SELECT c.name FROM catalog.category c WHERE c.id = p.category_id)
                      AS category_name
        ",
    )
    .bind(product.shop_id)
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.min_stock)
    .bind(product.is_active)
    .bind(product.is_highlighted)
    .bind(product.is_promotional)
    .bind(product.promotional_price)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_error("insert_product", e))?;
    written.apply(product);

    let product_id = product.id;
    for (index, image) in product.images.iter_mut().enumerate() {
        image.id = insert_image(conn, product_id, image, index).await?;
    }
    for (index, variant) in product.variants.iter_mut().enumerate() {
        insert_variant(conn, product_id, variant, index).await?;
    }

    Ok(())
}

async fn insert_image(
    conn: &mut PgConnection,
    product_id: ProductId,
    image: &ProductImage,
    index: usize,
) -> Result<ImageId, RepositoryError> {
    sqlx::query_scalar(
        r"
        INSERT INTO catalog.product_image (product_id, url, position)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(product_id)
    .bind(&image.url)
    .bind(to_position(index))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_error("insert_product_image", e))
}

/// Insert a new variant and all of its options.
async fn insert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    variant: &mut Variant,
    index: usize,
) -> Result<(), RepositoryError> {
    variant.id = sqlx::query_scalar(
        r"
        INSERT INTO catalog.product_variant (
            product_id, name, display_order, selection_type, max_selections, position
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(product_id)
    .bind(&variant.name)
    .bind(resolve_order(variant.order, index))
    .bind(variant.selection_type.as_str())
    .bind(variant.max_selections)
    .bind(to_position(index))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_error("insert_product_variant", e))?;

    for (option_index, option) in variant.options.iter_mut().enumerate() {
        if !option.id.is_unsaved() {
            return Err(RepositoryError::BusinessRule(format!(
                "option {} cannot belong to a new variant",
                option.id
            )));
        }
        option.id = insert_option(conn, variant.id, option, option_index).await?;
    }

    Ok(())
}

async fn insert_option(
    conn: &mut PgConnection,
    variant_id: VariantId,
    option: &VariantOption,
    index: usize,
) -> Result<OptionId, RepositoryError> {
    sqlx::query_scalar(
        r"
        INSERT INTO catalog.variant_option (variant_id, name, price, display_order, position)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(variant_id)
    .bind(&option.name)
    .bind(option.price)
    .bind(resolve_order(option.order, index))
    .bind(to_position(index))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| translate_error("insert_variant_option", e))
}

// =============================================================================
// Update
// =============================================================================

async fn merge_aggregate(
    conn: &mut PgConnection,
    product: &mut Product,
) -> Result<(), RepositoryError> {
    let written = sqlx::query_as::<_, WrittenProduct>(
        r"
        UPDATE catalog.product AS p
        SET category_id = $2,
            name = $3,
            description = $4,
            price = $5,
            stock = $6,
            min_stock = $7,
            is_active = $8,
            is_highlighted = $9,
            is_promotional = $10,
            promotional_price = $11,
            updated_at = now()
        WHERE p.id = $1
        RETURNING p.id, p.shop_id, p.created_at, p.updated_at,
                  (SELECT c.name FROM catalog.category c WHERE c.id = p.category_id)
                      AS category_name
        ",
    )
    .bind(product.id)
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.min_stock)
    .bind(product.is_active)
    .bind(product.is_highlighted)
    .bind(product.is_promotional)
    .bind(product.promotional_price)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| translate_error("update_product", e))?
    .ok_or_else(|| RepositoryError::product_not_found(product.id.as_i32()))?;
    written.apply(product);

    merge_images(conn, product.id, &mut product.images).await?;
    merge_variants(conn, product.id, &mut product.variants).await
}

/// IDs of the already persisted entries in a desired child list.
fn kept_ids<T>(items: &[T], id: impl Fn(&T) -> i32) -> Vec<i32> {
    items.iter().map(id).filter(|&id| id != 0).collect()
}

async fn merge_images(
    conn: &mut PgConnection,
    product_id: ProductId,
    images: &mut [ProductImage],
) -> Result<(), RepositoryError> {
    let kept = kept_ids(images, |image| image.id.as_i32());
    sqlx::query("DELETE FROM catalog.product_image WHERE product_id = $1 AND id <> ALL($2)")
        .bind(product_id)
        .bind(&kept)
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("delete_product_images", e))?;

    for (index, image) in images.iter_mut().enumerate() {
        if image.id.is_unsaved() {
            image.id = insert_image(conn, product_id, image, index).await?;
            continue;
        }

        let result = sqlx::query(
            r"
            UPDATE catalog.product_image
            SET url = $3, position = $4
            WHERE id = $1 AND product_id = $2
            ",
        )
        .bind(image.id)
        .bind(product_id)
        .bind(&image.url)
        .bind(to_position(index))
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("update_product_image", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::BusinessRule(format!(
                "image {} does not belong to product {product_id}",
                image.id
            )));
        }
    }

    Ok(())
}

async fn merge_variants(
    conn: &mut PgConnection,
    product_id: ProductId,
    variants: &mut [Variant],
) -> Result<(), RepositoryError> {
    let kept = kept_ids(variants, |variant| variant.id.as_i32());

    // Options reference variants, so dropped variants lose their options first.
    sqlx::query(
        r"
        DELETE FROM catalog.variant_option o
        USING catalog.product_variant v
        WHERE o.variant_id = v.id
          AND v.product_id = $1
          AND v.id <> ALL($2)
        ",
    )
    .bind(product_id)
    .bind(&kept)
    .execute(&mut *conn)
    .await
    .map_err(|e| translate_error("delete_variant_options", e))?;

    sqlx::query("DELETE FROM catalog.product_variant WHERE product_id = $1 AND id <> ALL($2)")
        .bind(product_id)
        .bind(&kept)
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("delete_product_variants", e))?;

    for (index, variant) in variants.iter_mut().enumerate() {
        if variant.id.is_unsaved() {
            insert_variant(conn, product_id, variant, index).await?;
            continue;
        }

        let result = sqlx::query(
            r"
            UPDATE catalog.product_variant
            SET name = $3, display_order = $4, selection_type = $5,
                max_selections = $6, position = $7
            WHERE id = $1 AND product_id = $2
            ",
        )
        .bind(variant.id)
        .bind(product_id)
        .bind(&variant.name)
        .bind(resolve_order(variant.order, index))
        .bind(variant.selection_type.as_str())
        .bind(variant.max_selections)
        .bind(to_position(index))
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("update_product_variant", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::BusinessRule(format!(
                "variant {} does not belong to product {product_id}",
                variant.id
            )));
        }

        merge_options(conn, variant.id, &mut variant.options).await?;
    }

    Ok(())
}

async fn merge_options(
    conn: &mut PgConnection,
    variant_id: VariantId,
    options: &mut [VariantOption],
) -> Result<(), RepositoryError> {
    let kept = kept_ids(options, |option| option.id.as_i32());
    sqlx::query("DELETE FROM catalog.variant_option WHERE variant_id = $1 AND id <> ALL($2)")
        .bind(variant_id)
        .bind(&kept)
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("delete_variant_options", e))?;

    for (index, option) in options.iter_mut().enumerate() {
        if option.id.is_unsaved() {
            option.id = insert_option(conn, variant_id, option, index).await?;
            continue;
        }

        let result = sqlx::query(
            r"
            UPDATE catalog.variant_option
            SET name = $3, price = $4, display_order = $5, position = $6
            WHERE id = $1 AND variant_id = $2
            ",
        )
        .bind(option.id)
        .bind(variant_id)
        .bind(&option.name)
        .bind(option.price)
        .bind(resolve_order(option.order, index))
        .bind(to_position(index))
        .execute(&mut *conn)
        .await
        .map_err(|e| translate_error("update_variant_option", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::BusinessRule(format!(
                "option {} does not belong to variant {variant_id}",
                option.id
            )));
        }
    }

    Ok(())
}
