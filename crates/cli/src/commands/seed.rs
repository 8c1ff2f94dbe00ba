//! Seed the catalog with a shop, its categories and products from a YAML file.
//!
//! The whole file is loaded in one transaction; each product is written by
//! the store's `ProductWriter` inside a savepoint of that transaction, so a
//! single bad product aborts the entire seed.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use catalog_core::{
    CategoryId, Product, ProductImage, SelectionType, ShopId, Variant, VariantOption,
};
use catalog_store::{CatalogConfig, ProductWriter, create_pool};

/// Top-level layout of a seed file.
#[derive(Debug, Deserialize)]
struct SeedFile {
    shop: String,
    categories: Vec<String>,
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    category: String,
    #[serde(default)]
    description: String,
    price: Decimal,
    #[serde(default)]
    stock: i32,
    #[serde(default)]
    min_stock: i32,
    #[serde(default)]
    highlighted: bool,
    #[serde(default)]
    promotional_price: Option<Decimal>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
struct SeedVariant {
    name: String,
    #[serde(default)]
    selection_type: SelectionType,
    #[serde(default)]
    max_selections: Option<i32>,
    #[serde(default)]
    order: Option<i32>,
    #[serde(default)]
    options: Vec<SeedOption>,
}

#[derive(Debug, Deserialize)]
struct SeedOption {
    name: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    order: Option<i32>,
}

impl SeedProduct {
    fn into_product(self, category_id: CategoryId) -> Product {
        let mut product = Product::new(self.name, self.price, category_id);
        product.description = self.description;
        product.stock = self.stock;
        product.min_stock = self.min_stock;
        product.is_highlighted = self.highlighted;
        product.is_promotional = self.promotional_price.is_some();
        product.promotional_price = self.promotional_price;
        product.images = self.images.into_iter().map(ProductImage::new).collect();
        product.variants = self.variants.into_iter().map(SeedVariant::into_variant).collect();
        product
    }
}

impl SeedVariant {
    fn into_variant(self) -> Variant {
        let mut variant = Variant::new(self.name, self.selection_type);
        variant.order = self.order;
        if let Some(max) = self.max_selections {
            variant.max_selections = max;
        }
        variant.options = self
            .options
            .into_iter()
            .map(|option| VariantOption {
                order: option.order,
                ..VariantOption::new(option.name, option.price)
            })
            .collect();
        variant
    }
}

/// Seed the catalog from a YAML file.
///
/// Categories are matched by name and created if missing. A new shop is
/// created on every run.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a product fails
/// validation, or any database write fails. Nothing is written in that case.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let config = CatalogConfig::from_env()?;
    let pool = create_pool(&config).await?;
    let writer = ProductWriter::new(&pool);
    let mut tx = pool.begin().await?;

    let shop_id: ShopId =
        sqlx::query_scalar("INSERT INTO catalog.shop (name) VALUES ($1) RETURNING id")
            .bind(&seed.shop)
            .fetch_one(&mut *tx)
            .await?;
    info!(shop_id = %shop_id, name = %seed.shop, "Created shop");

    let mut categories = HashMap::new();
    for name in &seed.categories {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO catalog.category (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        categories.insert(name.as_str(), id);
    }

    for entry in seed.products {
        let category_id = categories
            .get(entry.category.as_str())
            .copied()
            .ok_or_else(|| {
                format!("product {:?}: unknown category {:?}", entry.name, entry.category)
            })?;

        let mut product = entry.into_product(category_id);
        product.validate()?;
        writer.create(&mut product, shop_id, Some(&mut *tx)).await?;
        info!(product_id = %product.id, name = %product.name, "Seeded product");
    }

    tx.commit().await?;
    info!("Seeding complete!");
    Ok(())
}
