//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/store/migrations/` and are embedded into the
//! binary at compile time.

use catalog_store::{CatalogConfig, create_pool};

/// Run the catalog schema migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;

    tracing::info!("Connecting to catalog database...");
    let pool = create_pool(&config).await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../store/migrations").run(&pool).await?;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
