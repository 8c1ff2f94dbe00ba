//! Catalog CLI - Database migrations, seeding and inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog database migrations
//! catalog-cli migrate
//!
//! # Seed a shop with categories and products
//! catalog-cli seed crates/cli/fixtures/demo_catalog.yaml
//!
//! # Print one product
//! catalog-cli products get 42
//!
//! # Print the first page of a shop's products, then the next one
//! catalog-cli products list --shop 1 --limit 10
//! catalog-cli products list --shop 1 --limit 10 --cursor 31
//! ```
//!
//! # Logging
//!
//! `RUST_LOG` selects the filter (default `catalog_store=info,catalog_cli=info`).
//! Set `CATALOG_LOG_FORMAT=json` for JSON lines instead of human-readable output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Product catalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Inspect stored products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Print a product with its images, variants and options
    Get {
        /// Product ID
        id: i32,
    },
    /// Print a page of a shop's products, newest first
    List {
        /// Shop ID
        #[arg(short, long)]
        shop: i32,

        /// Page size (clamped to 1..=100, 0 means 20)
        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Continue below this product ID (0 starts at the newest)
        #[arg(short, long, default_value_t = 0)]
        cursor: i32,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("catalog_store=info,catalog_cli=info"));
    let json = std::env::var("CATALOG_LOG_FORMAT").is_ok_and(|format| format == "json");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Products { action } => match action {
            ProductsAction::Get { id } => commands::products::get(id).await?,
            ProductsAction::List {
                shop,
                limit,
                cursor,
            } => commands::products::list(shop, limit, cursor).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["catalog-cli", "products", "list", "--shop", "3"]);
        assert!(matches!(
            cli.map(|cli| cli.command),
            Ok(Commands::Products {
                action: ProductsAction::List {
                    shop: 3,
                    limit: 20,
                    cursor: 0
                }
            })
        ));
    }
}
