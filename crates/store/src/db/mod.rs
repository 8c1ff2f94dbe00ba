//! Database operations for the catalog `PostgreSQL`.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `shop` - Tenants (read-only here)
//! - `category` - Product categories (read-only here)
//! - `product` - Product scalars, unique per `(shop_id, name)`
//! - `product_image` - Images owned by a product
//! - `product_variant` - Variants owned by a product
//! - `variant_option` - Options owned by a variant
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```
//!
//! # Errors
//!
//! Every `sqlx::Error` is passed through [`translate_error`] before it leaves
//! this module, so callers only ever see a [`RepositoryError`] whose
//! [`kind`](RepositoryError::kind) is one of the domain error kinds.

pub mod products;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use catalog_core::ErrorKind;

use crate::config::CatalogConfig;

pub use products::{ProductReader, ProductWriter};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database failure with no domain meaning.
    ///
    /// Carries no engine text; the full error is logged by [`translate_error`].
    #[error("internal database error in {operation}")]
    Database {
        /// Repository operation that failed.
        operation: &'static str,
        /// SQLSTATE reported by the server, if any.
        sqlstate: Option<String>,
    },

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, used to build the error code.
        entity: &'static str,
        /// Requested ID (`0` when unknown).
        id: i32,
    },

    /// Unique constraint violation (e.g., product name within a shop).
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Input rejected by a check or not-null constraint.
    #[error("invalid data: {0}")]
    Validation(String),

    /// Semantically invalid write (e.g., unknown category, foreign child ID).
    #[error("business rule violated: {0}")]
    BusinessRule(String),
}

impl RepositoryError {
    /// Domain classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Database { .. } | Self::DataCorruption(_) => ErrorKind::Internal,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::Validation(_) => ErrorKind::Validation,
            Self::BusinessRule(_) => ErrorKind::BusinessRule,
        }
    }

    /// Stable machine-readable error code (e.g. `product_not_found`).
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("{entity}_not_found"),
            Self::Duplicate(_) => "duplicate_record".to_owned(),
            Self::Validation(_) => "invalid_data".to_owned(),
            Self::BusinessRule(_) => "business_rule_violation".to_owned(),
            Self::Database { .. } | Self::DataCorruption(_) => "internal_error".to_owned(),
        }
    }

    pub(crate) const fn product_not_found(id: i32) -> Self {
        Self::NotFound {
            entity: "product",
            id,
        }
    }
}

/// Create a `PostgreSQL` connection pool bounded by the configured limits.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &CatalogConfig) -> Result<PgPool, sqlx::Error> {
    let pool = &config.pool;
    PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .max_lifetime(pool.max_lifetime)
        .idle_timeout(pool.idle_timeout)
        .acquire_timeout(pool.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Translate a `sqlx::Error` raised by `operation` into a [`RepositoryError`].
///
/// Constraint violations become domain errors with messages chosen here, never
/// the engine's own text. Everything else is logged with its full detail and
/// returned as an opaque `Database` error.
pub fn translate_error(operation: &'static str, err: sqlx::Error) -> RepositoryError {
    let sqlstate = match &err {
        sqlx::Error::RowNotFound => {
            return RepositoryError::NotFound {
                entity: "record",
                id: 0,
            };
        }
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            if let Some(translated) =
                classify_violation(db_err.kind(), code.as_deref(), db_err.constraint())
            {
                tracing::debug!(
                    operation,
                    sqlstate = code.as_deref().unwrap_or_default(),
                    constraint = db_err.constraint().unwrap_or_default(),
                    "Constraint violation"
                );
                return translated;
            }
            tracing::error!(
                operation,
                sqlstate = code.as_deref().unwrap_or_default(),
                message = db_err.message(),
                "Database error"
            );
            code.map(std::borrow::Cow::into_owned)
        }
        other => {
            tracing::error!(operation, error = %other, "Database error");
            None
        }
    };

    RepositoryError::Database {
        operation,
        sqlstate,
    }
}

/// Map a database-reported violation to a domain error, if it has one.
fn classify_violation(
    kind: sqlx::error::ErrorKind,
    sqlstate: Option<&str>,
    constraint: Option<&str>,
) -> Option<RepositoryError> {
    use sqlx::error::ErrorKind as DbKind;

    let described = constraint.and_then(describe_constraint);
    match kind {
        DbKind::UniqueViolation => Some(RepositoryError::Duplicate(
            described
                .unwrap_or("record conflicts with an existing one")
                .to_owned(),
        )),
        DbKind::ForeignKeyViolation => Some(RepositoryError::BusinessRule(
            described
                .unwrap_or("referenced record does not exist")
                .to_owned(),
        )),
        DbKind::NotNullViolation | DbKind::CheckViolation => Some(RepositoryError::Validation(
            described
                .unwrap_or("value violates a data constraint")
                .to_owned(),
        )),
        // Class 22: data exception (numeric overflow, invalid text representation, ...)
        _ if sqlstate.is_some_and(|code| code.starts_with("22")) => Some(
            RepositoryError::Validation("value is out of range or malformed".to_owned()),
        ),
        _ => None,
    }
}

/// Caller-facing description of a named schema constraint.
fn describe_constraint(constraint: &str) -> Option<&'static str> {
    let message = match constraint {
        "product_shop_name_key" => "a product with this name already exists in the shop",
        "product_shop_id_fkey" => "shop does not exist",
        "product_category_id_fkey" => "category does not exist",
        "product_image_product_id_fkey" | "product_variant_product_id_fkey" => {
            "product does not exist"
        }
        "variant_option_variant_id_fkey" => "variant does not exist",
        "product_name_not_blank" => "product name cannot be empty",
        "product_price_positive" => "price must be greater than zero",
        "product_stock_non_negative" => "stock cannot be negative",
        "product_min_stock_non_negative" => "minimum stock cannot be negative",
        "product_min_stock_within_stock" => "minimum stock cannot exceed stock",
        "product_promotional_price_consistent" => {
            "promotional price must be set and positive exactly when the product is promotional"
        }
        "product_image_url_not_blank" => "image url cannot be empty",
        "product_variant_name_not_blank" => "variant name cannot be empty",
        "product_variant_order_non_negative" => "variant display order cannot be negative",
        "product_variant_selection_type_check" => "unknown selection type",
        "product_variant_max_selections_non_negative" => "max selections cannot be negative",
        "variant_option_name_not_blank" => "option name cannot be empty",
        "variant_option_price_non_negative" => "option price cannot be negative",
        "variant_option_order_non_negative" => "option display order cannot be negative",
        _ => return None,
    };
    Some(message)
}
