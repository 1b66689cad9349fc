//! CLI command implementations.
//!
//! Each command renders its report into a writer so it can be tested without
//! touching the terminal.

pub mod cart;
pub mod catalog;

use thiserror::Error;

use marketstall_storefront::cart::StorageError;
use marketstall_storefront::catalog::CatalogError;
use marketstall_storefront::config::ConfigError;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("cart storage: {0}")]
    Storage(#[from] StorageError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output: {0}")]
    Io(#[from] std::io::Error),
}
