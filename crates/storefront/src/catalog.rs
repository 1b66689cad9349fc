//! Catalog collaborator boundary.
//!
//! Listing browsing, search and filtering live outside the checkout core.
//! The core only needs to look up a listing by ID and copy its fields by
//! value when it lands in a cart or a buy-now checkout.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketstall_core::{ItemId, Price};

/// Errors loading a catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a JSON array of listings.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two listings share an ID.
    #[error("duplicate listing id: {0}")]
    DuplicateId(ItemId),

    /// Buying the whole available quantity would overflow the price type.
    #[error("listing price too large for its quantity: {0}")]
    PriceOverflow(ItemId),
}

/// Condition of a second-hand or new item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    New,
    LikeNew,
    Good,
    Fair,
}

/// A purchasable listing as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ItemId,
    pub title: String,
    pub price: Price,
    /// How many units the seller can supply right now.
    pub available_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub location: String,
    #[serde(default)]
    pub condition: Condition,
    pub seller: String,
}

/// Read access to listings.
pub trait Catalog: Send + Sync {
    /// Look up a single listing.
    fn listing(&self, id: &ItemId) -> Option<Listing>;

    /// All listings, in display order.
    fn listings(&self) -> Vec<Listing>;
}

/// Catalog backed by a fixed list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    listings: Vec<Listing>,
}

impl InMemoryCatalog {
    /// Create a catalog from listings.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two listings share an ID, or
    /// `CatalogError::PriceOverflow` if a listing's price times its
    /// available quantity is not representable.
    pub fn new(listings: Vec<Listing>) -> Result<Self, CatalogError> {
        for (idx, listing) in listings.iter().enumerate() {
            if listing.price.checked_times(listing.available_quantity).is_none() {
                return Err(CatalogError::PriceOverflow(listing.id.clone()));
            }
            if listings
                .iter()
                .skip(idx + 1)
                .any(|other| other.id == listing.id)
            {
                return Err(CatalogError::DuplicateId(listing.id.clone()));
            }
        }
        Ok(Self { listings })
    }

    /// Load a catalog from a JSON file containing an array of listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or contains
    /// duplicate IDs.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let listings: Vec<Listing> = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), count = listings.len(), "Loaded catalog");
        Self::new(listings)
    }

    /// The built-in demo catalog.
    #[must_use]
    pub fn demo() -> Self {
        let listing = |id: &str, title: &str, cents: u32, qty: u32, location: &str, condition| {
            Listing {
                id: ItemId::new(id),
                title: title.to_owned(),
                price: Price::from_cents(cents),
                available_quantity: qty,
                image_url: Some(format!("/static/images/listings/{id}.jpg")),
                location: location.to_owned(),
                condition,
                seller: "marketstall-demo".to_owned(),
            }
        };

        Self {
            listings: vec![
                listing("p1", "Walnut side table", 2000, 3, "Portland, OR", Condition::Good),
                listing("p2", "Enamel camping mug", 1500, 12, "Denver, CO", Condition::New),
                listing("p3", "Film camera (35mm)", 8900, 1, "Austin, TX", Condition::Fair),
                listing("p4", "Wool throw blanket", 4250, 5, "Burlington, VT", Condition::LikeNew),
                listing("p5", "Cast iron skillet", 3000, 0, "Asheville, NC", Condition::Good),
            ],
        }
    }

    /// Number of listings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the catalog has no listings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn listing(&self, id: &ItemId) -> Option<Listing> {
        self.listings.iter().find(|l| &l.id == id).cloned()
    }

    fn listings(&self) -> Vec<Listing> {
        self.listings.clone()
    }
}
