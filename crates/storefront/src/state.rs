//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::{CartStorage, FileCartStorage};
use crate::catalog::{Catalog, CatalogError, InMemoryCatalog};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, cart storage and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartStorage>,
}

impl AppState {
    /// Create application state from explicit collaborators.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn Catalog>,
        carts: Arc<dyn CartStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
            }),
        }
    }

    /// Create application state as configured: file-backed carts, and the
    /// catalog file or the demo catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the configured catalog file cannot be loaded.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, CatalogError> {
        let catalog = match &config.catalog_path {
            Some(path) => InMemoryCatalog::from_json_file(path)?,
            None => {
                tracing::info!("No catalog file configured, using demo catalog");
                InMemoryCatalog::demo()
            }
        };
        let carts = FileCartStorage::new(config.cart_dir.clone());

        Ok(Self::new(config, Arc::new(catalog), Arc::new(carts)))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a handle to the listing catalog.
    #[must_use]
    pub fn catalog(&self) -> Arc<dyn Catalog> {
        Arc::clone(&self.inner.catalog)
    }

    /// Get a handle to the durable cart storage.
    #[must_use]
    pub fn carts(&self) -> Arc<dyn CartStorage> {
        Arc::clone(&self.inner.carts)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
