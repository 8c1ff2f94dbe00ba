//! Product inspection commands.
//!
//! Products are printed as pretty JSON on stdout. Images and variants use the
//! same child document shape the store aggregates them into.

use serde_json::{Value, json};

use catalog_core::codec::{self, CodecError};
use catalog_core::{Page, Product, ProductId, ShopId};
use catalog_store::{CatalogConfig, ProductReader, create_pool};

/// Print one product with its images, variants and options.
///
/// # Errors
///
/// Returns an error if the product does not exist or the database fails.
pub async fn get(id: i32) -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;
    let pool = create_pool(&config).await?;

    let product = ProductReader::new(&pool).get_by_id(ProductId::new(id)).await?;
    print_json(&product_document(&product)?)
}

/// Print one page of a shop's products with its continuation cursor.
///
/// # Errors
///
/// Returns an error if the database fails.
pub async fn list(shop: i32, limit: i64, cursor: i32) -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;
    let pool = create_pool(&config).await?;

    let page = ProductReader::new(&pool)
        .list_page(ShopId::new(shop), limit, cursor)
        .await?;

    tracing::info!(
        items = page.items.len(),
        next_cursor = page.next_cursor,
        has_more = page.has_more,
        "Fetched page"
    );
    print_json(&page_document(&page)?)
}

fn product_document(product: &Product) -> Result<Value, CodecError> {
    Ok(json!({
        "id": product.id,
        "shop_id": product.shop_id,
        "category_id": product.category_id,
        "category_name": product.category_name,
        "name": product.name,
        "description": product.description,
        "price": product.price,
        "stock": product.stock,
        "min_stock": product.min_stock,
        "is_active": product.is_active,
        "is_highlighted": product.is_highlighted,
        "is_promotional": product.is_promotional,
        "promotional_price": product.promotional_price,
        "images": codec::encode_images(&product.images)?,
        "variants": codec::encode_variants(&product.variants)?,
        "created_at": product.created_at,
        "updated_at": product.updated_at,
    }))
}

fn page_document(page: &Page<Product>) -> Result<Value, CodecError> {
    let items = page
        .items
        .iter()
        .map(product_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "items": items,
        "next_cursor": page.next_cursor,
        "has_more": page.has_more,
    }))
}

#[allow(clippy::print_stdout)]
fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use catalog_core::{
        CategoryId, OptionId, ProductImage, SelectionType, Variant, VariantId, VariantOption,
    };

    use super::*;

    fn shirt() -> Product {
        let mut product = Product::new("Tee", Decimal::new(2490, 2), CategoryId::new(4))
            .with_image(ProductImage::new("https://cdn.example.com/tee.jpg"))
            .with_variant(
                Variant::new("Size", SelectionType::Single)
                    .with_option(VariantOption::new("Large", Decimal::new(250, 2))),
            );
        product.id = ProductId::new(12);
        product.variants[0].id = VariantId::new(3);
        product.variants[0].options[0].id = OptionId::new(8);
        product
    }

    #[test]
    fn test_product_document_uses_child_codec() {
        let doc = product_document(&shirt()).unwrap();

        assert_eq!(doc["id"], 12);
        assert_eq!(doc["price"], "24.90");
        assert_eq!(doc["images"][0]["url"], "https://cdn.example.com/tee.jpg");
        assert_eq!(doc["variants"][0]["id"], 3);
        assert_eq!(doc["variants"][0]["options"][0]["price"], "2.50");
        assert!(doc["created_at"].is_null());

        let decoded = codec::decode_variants(doc["variants"].clone()).unwrap();
        assert_eq!(decoded, shirt().variants);
    }

    #[test]
    fn test_page_document_carries_cursor() {
        let page = Page {
            items: vec![shirt()],
            next_cursor: 12,
            has_more: true,
        };
        let doc = page_document(&page).unwrap();

        assert_eq!(doc["items"].as_array().unwrap().len(), 1);
        assert_eq!(doc["next_cursor"], 12);
        assert_eq!(doc["has_more"], true);
    }
}
