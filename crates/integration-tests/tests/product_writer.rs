//! Integration tests for atomic product create and update.
//!
//! These tests require a running `PostgreSQL` reachable through `DATABASE_URL`.
//!
//! Run with: cargo test -p catalog-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::timeout;

use catalog_core::{
    CategoryId, ErrorKind, ImageId, ProductId, ProductImage, SelectionType, Variant,
    VariantOption,
};
use catalog_integration_tests::{count_rows, sample_product, seed_category, seed_shop};
use catalog_store::{ProductReader, ProductWriter};

// =============================================================================
// Create
// =============================================================================

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_assigns_every_id(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let mut product = sample_product("Tee", category);

    ProductWriter::new(&pool)
        .create(&mut product, shop, None)
        .await
        .unwrap();

    assert!(product.is_persisted());
    assert_eq!(product.shop_id, shop);
    assert_eq!(product.category_name.as_deref(), Some("Apparel"));
    assert!(product.created_at.is_some());
    assert!(product.images.iter().all(|image| !image.id.is_unsaved()));
    for variant in &product.variants {
        assert!(!variant.id.is_unsaved());
        assert!(variant.options.iter().all(|option| !option.id.is_unsaved()));
    }
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_then_get_preserves_aggregate(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let mut product = sample_product("Tee", category);

    ProductWriter::new(&pool)
        .create(&mut product, shop, None)
        .await
        .unwrap();
    let fetched = ProductReader::new(&pool).get_by_id(product.id).await.unwrap();

    assert_eq!(fetched.name, "Tee");
    assert_eq!(fetched.price, Decimal::new(2490, 2));
    assert_eq!(fetched.images, product.images);
    assert_eq!(fetched.variants, product.variants);

    // Unset orders fall back to list position, explicit ones are kept.
    let size = &fetched.variants[0];
    assert_eq!(size.order, Some(0));
    assert_eq!(size.selection_type, SelectionType::Single);
    assert_eq!(size.options[0].name, "Small");
    assert_eq!(size.options[0].order, Some(0));
    assert_eq!(size.options[1].name, "Large");
    assert_eq!(size.options[1].order, Some(0));
    assert_eq!(size.options[1].price, Decimal::new(300, 2));
    assert_eq!(fetched.variants[1].order, Some(5));
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_child_insert_rolls_back_everything(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let mut product = sample_product("Tee", category);
    product.variants[1].options.push(VariantOption::new("  ", Decimal::ZERO));
    let before = product.clone();

    let err = ProductWriter::new(&pool)
        .create(&mut product, shop, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(product, before, "input must not receive staged IDs");
    assert_eq!(count_rows(&pool, "product").await, 0);
    assert_eq!(count_rows(&pool, "product_image").await, 0);
    assert_eq!(count_rows(&pool, "product_variant").await, 0);
    assert_eq!(count_rows(&pool, "variant_option").await, 0);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_name_in_shop(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);

    writer
        .create(&mut sample_product("Tee", category), shop, None)
        .await
        .unwrap();
    let err = writer
        .create(&mut sample_product("Tee", category), shop, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert!(!err.to_string().contains("duplicate key value"));
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_same_name_in_other_shop_is_allowed(pool: PgPool) {
    let first = seed_shop(&pool, "First").await;
    let second = seed_shop(&pool, "Second").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);

    writer
        .create(&mut sample_product("Tee", category), first, None)
        .await
        .unwrap();
    writer
        .create(&mut sample_product("Tee", category), second, None)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unknown_category_is_business_rule(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let mut product = sample_product("Tee", CategoryId::new(9999));

    let err = ProductWriter::new(&pool)
        .create(&mut product, shop, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert!(err.to_string().contains("category does not exist"));
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_create_inside_caller_transaction(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);
    let mut product = sample_product("Tee", category);

    let mut tx = pool.begin().await.unwrap();
    writer
        .create(&mut product, shop, Some(&mut *tx))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    let err = ProductReader::new(&pool).get_by_id(product.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_nested_create_keeps_caller_transaction(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);

    let mut tx = pool.begin().await.unwrap();
    writer
        .create(&mut sample_product("Tee", category), shop, Some(&mut *tx))
        .await
        .unwrap();
    let err = writer
        .create(&mut sample_product("Tee", category), shop, Some(&mut *tx))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    tx.commit().await.unwrap();

    assert_eq!(count_rows(&pool, "product").await, 1);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_cancelled_create_leaves_nothing_behind(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);
    let mut product = (0..5000).fold(sample_product("Tee", category), |product, n| {
        product.with_image(ProductImage::new(format!("https://cdn.example.com/tee/{n}.jpg")))
    });

    let outcome = timeout(
        Duration::from_millis(10),
        writer.create(&mut product, shop, None),
    )
    .await;

    assert!(outcome.is_err());
    assert!(product.id.is_unsaved());
    assert!(product.images.iter().all(|image| image.id.is_unsaved()));
    assert_eq!(count_rows(&pool, "product").await, 0);
    assert_eq!(count_rows(&pool, "product_image").await, 0);

    // The abandoned transaction holds nothing that blocks a retry.
    writer
        .create(&mut sample_product("Tee", category), shop, None)
        .await
        .unwrap();
    assert_eq!(count_rows(&pool, "product").await, 1);
}

// =============================================================================
// Update
// =============================================================================

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_missing_product_is_not_found(pool: PgPool) {
    let category = seed_category(&pool, "Apparel").await;
    let mut product = sample_product("Tee", category);

    let err = ProductWriter::new(&pool)
        .update(ProductId::new(4242), &mut product, Vec::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.code(), "product_not_found");
    assert_eq!(count_rows(&pool, "product_image").await, 0);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_merges_children(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);
    let mut product = sample_product("Tee", category);
    writer.create(&mut product, shop, None).await.unwrap();

    let kept_image = product.images[1].id;
    let kept_variant = product.variants[0].id;
    let kept_option = product.variants[0].options[1].id;
    let dropped_variant = product.variants[1].id;

    let mut changed = product.clone();
    changed.name = "Tee v2".to_owned();
    changed.images.remove(0);
    changed.variants[0].name = "Size (EU)".to_owned();
    changed.variants[0].options.remove(0);
    changed.variants[0]
        .options
        .push(VariantOption::new("Medium", Decimal::new(100, 2)));
    changed.variants.truncate(1);
    changed.variants.push(
        Variant::new("Colour", SelectionType::Multiple)
            .with_option(VariantOption::new("Red", Decimal::ZERO)),
    );

    writer
        .update(
            product.id,
            &mut changed,
            vec![ProductImage::new("https://cdn.example.com/tee/side.jpg")],
            None,
        )
        .await
        .unwrap();

    let fetched = ProductReader::new(&pool).get_by_id(product.id).await.unwrap();
    assert_eq!(fetched.name, "Tee v2");
    assert_eq!(fetched.images.len(), 2);
    assert_eq!(fetched.images[0].id, kept_image);
    assert_eq!(fetched.images[1].url, "https://cdn.example.com/tee/side.jpg");
    assert_ne!(fetched.images[1].id, ImageId::UNSAVED);

    assert_eq!(fetched.variants.len(), 2);
    assert_eq!(fetched.variants[0].id, kept_variant);
    assert_eq!(fetched.variants[0].name, "Size (EU)");
    let option_names: Vec<_> = fetched.variants[0]
        .options
        .iter()
        .map(|option| option.name.as_str())
        .collect();
    assert_eq!(option_names, ["Large", "Medium"]);
    assert_eq!(fetched.variants[0].options[0].id, kept_option);
    assert_eq!(fetched.variants[1].name, "Colour");
    assert!(fetched.variants.iter().all(|variant| variant.id != dropped_variant));

    assert_eq!(fetched.images, changed.images);
    assert_eq!(fetched.variants, changed.variants);
    assert_eq!(count_rows(&pool, "variant_option").await, 3);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_with_foreign_image_rolls_back(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);
    let mut tee = sample_product("Tee", category);
    let mut mug = sample_product("Mug", category);
    writer.create(&mut tee, shop, None).await.unwrap();
    writer.create(&mut mug, shop, None).await.unwrap();

    let mut changed = tee.clone();
    changed.name = "Stolen".to_owned();
    changed.images[0].id = mug.images[0].id;

    let err = writer
        .update(tee.id, &mut changed, Vec::new(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    let fetched = ProductReader::new(&pool).get_by_id(tee.id).await.unwrap();
    assert_eq!(fetched.name, "Tee");
    assert_eq!(fetched.images, tee.images);
}

#[sqlx::test(migrations = "../store/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_update_rejects_saved_option_under_new_variant(pool: PgPool) {
    let shop = seed_shop(&pool, "Shop").await;
    let category = seed_category(&pool, "Apparel").await;
    let writer = ProductWriter::new(&pool);
    let mut product = sample_product("Tee", category);
    writer.create(&mut product, shop, None).await.unwrap();

    let mut changed = product.clone();
    let mut stray = VariantOption::new("Stray", Decimal::ZERO);
    stray.id = product.variants[0].options[0].id;
    changed
        .variants
        .push(Variant::new("Extra", SelectionType::Single).with_option(stray));

    let err = writer
        .update(product.id, &mut changed, Vec::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(count_rows(&pool, "product_variant").await, 2);
}
