//! Marketstall CLI - operator tools for persisted carts and the catalog.
//!
//! # Usage
//!
//! ```bash
//! # Show a persisted cart (the key is the `cart_key` from a browser session)
//! mst-cli cart show 3f2a9c...
//!
//! # Show it as JSON
//! mst-cli cart show 3f2a9c... --json
//!
//! # Delete a persisted cart
//! mst-cli cart clear 3f2a9c...
//!
//! # List catalog listings
//! mst-cli catalog list
//! ```
//!
//! Reads the same `MARKETSTALL_*` environment as the storefront.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};

use marketstall_core::CartKey;
use marketstall_storefront::cart::{CartStorage, FileCartStorage};
use marketstall_storefront::catalog::InMemoryCatalog;
use marketstall_storefront::config::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "mst-cli")]
#[command(author, version, about = "Marketstall CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or clear persisted carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect the listing catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the lines and total of a cart
    Show {
        /// Cart key
        key: String,

        /// Print the cart as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a cart
    Clear {
        /// Cart key
        key: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List all listings
    List,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Cart { action } => {
            let storage: Arc<dyn CartStorage> = Arc::new(FileCartStorage::new(config.cart_dir));
            match action {
                CartAction::Show { key, json } => {
                    commands::cart::show(storage, &CartKey::new(key), json, &mut out)?;
                }
                CartAction::Clear { key } => {
                    commands::cart::clear(storage.as_ref(), &CartKey::new(key), &mut out)?;
                }
            }
        }
        Commands::Catalog {
            action: CatalogAction::List,
        } => {
            let catalog = match &config.catalog_path {
                Some(path) => InMemoryCatalog::from_json_file(path)?,
                None => InMemoryCatalog::demo(),
            };
            commands::catalog::list(&catalog, &mut out)?;
        }
    }
    Ok(())
}
