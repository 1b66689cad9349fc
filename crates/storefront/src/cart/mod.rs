//! Cart Store.
//!
//! The cart is the durable list of items a shopper intends to buy. It is
//! keyed by [`CartKey`] in a [`CartStorage`] backend and re-serialized after
//! every mutation. Each [`CartLine`] copies the listing's price and display
//! fields at add-time, so catalog changes never reach into an existing cart.
//!
//! # Invariants
//!
//! - At most one line per `ItemId`.
//! - Every stored line has `1 <= quantity <= available_quantity`; a line
//!   whose quantity drops to zero is removed.

pub mod storage;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use marketstall_core::{CartKey, ItemId, Price};

use crate::catalog::{Condition, Listing};

pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError};

/// Display fields copied from the listing so the cart renders without the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub title: String,
    pub image_url: Option<String>,
    pub location: String,
    pub condition: Condition,
}

impl From<&Listing> for ItemSnapshot {
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            image_url: listing.image_url.clone(),
            location: listing.location.clone(),
            condition: listing.condition,
        }
    }
}

/// One entry in a cart (or the single line of a buy-now checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    item_id: ItemId,
    unit_price: Price,
    quantity: u32,
    available_quantity: u32,
    snapshot: ItemSnapshot,
}

impl CartLine {
    /// Build a line for `quantity` units of `listing`, clamped to the
    /// listing's availability.
    ///
    /// Returns `None` if the clamped quantity is zero.
    #[must_use]
    pub fn from_listing(listing: &Listing, quantity: u32) -> Option<Self> {
        let quantity = quantity.min(listing.available_quantity);
        (quantity > 0).then(|| Self {
            item_id: listing.id.clone(),
            unit_price: listing.price,
            quantity,
            available_quantity: listing.available_quantity,
            snapshot: ItemSnapshot::from(listing),
        })
    }

    #[must_use]
    pub const fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// Price per unit, fixed when the line was created.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Availability ceiling captured when the line was created.
    #[must_use]
    pub const fn available_quantity(&self) -> u32 {
        self.available_quantity
    }

    #[must_use]
    pub const fn snapshot(&self) -> &ItemSnapshot {
        &self.snapshot
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    const fn is_valid(&self) -> bool {
        self.quantity >= 1 && self.quantity <= self.available_quantity
    }
}

/// Sum of subtotals over `lines`.
#[must_use]
pub fn total_of(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::subtotal).sum()
}

/// Sum of subtotals over `lines`, or `None` if any step overflows.
#[must_use]
pub fn checked_total_of(lines: &[CartLine]) -> Option<Price> {
    lines.iter().try_fold(Price::ZERO, |acc, line| {
        acc.checked_add(line.unit_price.checked_times(line.quantity)?)
    })
}

/// Sum of quantities over `lines`.
#[must_use]
pub fn count_of(lines: &[CartLine]) -> u32 {
    lines
        .iter()
        .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
}

/// Serializable view of a cart: its lines and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub count: u32,
    pub total: Price,
}

/// The shopper's cart, persisted through a [`CartStorage`] backend.
pub struct CartStore {
    key: CartKey,
    lines: Vec<CartLine>,
    storage: Arc<dyn CartStorage>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Rehydrate the cart stored under `key`.
    ///
    /// Never fails: a missing, unreadable or malformed payload yields an
    /// empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn CartStorage>, key: CartKey) -> Self {
        let lines = match storage.load(&key) {
            Ok(Some(payload)) => decode_lines(&key, &payload),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(cart_key = %key, error = %e, "Failed to read persisted cart, starting empty");
                Vec::new()
            }
        };

        Self {
            key,
            lines,
            storage,
        }
    }

    /// The storage key of this cart.
    #[must_use]
    pub const fn key(&self) -> &CartKey {
        &self.key
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for an item.
    #[must_use]
    pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.item_id == item_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` units of `listing`.
    ///
    /// Merges into an existing line for the same item by summing quantities.
    /// The result is clamped to the availability captured when the line was
    /// first created. Adding zero units, or adding an unavailable listing,
    /// changes nothing.
    pub fn add_item(&mut self, listing: &Listing, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == listing.id) {
            let merged = line
                .quantity
                .saturating_add(quantity)
                .min(line.available_quantity);
            if merged == line.quantity {
                debug!(item_id = %listing.id, quantity = merged, "Cart line already at ceiling");
                return;
            }
            line.quantity = merged;
            debug!(item_id = %listing.id, quantity = merged, "Merged into cart line");
        } else {
            let Some(line) = CartLine::from_listing(listing, quantity) else {
                warn!(item_id = %listing.id, "Listing unavailable, not added to cart");
                return;
            };
            debug!(item_id = %listing.id, quantity = line.quantity, "Added cart line");
            self.lines.push(line);
        }

        self.persist();
    }

    /// Remove the line for `item_id`. Removing an absent item is a no-op.
    pub fn remove_item(&mut self, item_id: &ItemId) {
        let before = self.lines.len();
        self.lines.retain(|l| &l.item_id != item_id);
        if self.lines.len() != before {
            debug!(item_id = %item_id, "Removed cart line");
            self.persist();
        }
    }

    /// Set the quantity of an existing line.
    ///
    /// Zero removes the line. Quantities above the line's captured
    /// availability are clamped to it. Unknown items are ignored.
    pub fn set_quantity(&mut self, item_id: &ItemId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(item_id);
            return;
        }

        let Some(line) = self.lines.iter_mut().find(|l| &l.item_id == item_id) else {
            debug!(item_id = %item_id, "Quantity change for item not in cart");
            return;
        };

        let clamped = quantity.min(line.available_quantity);
        if clamped == line.quantity {
            return;
        }
        line.quantity = clamped;
        debug!(item_id = %item_id, quantity = clamped, "Updated cart line quantity");
        self.persist();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        debug!(cart_key = %self.key, "Cleared cart");
        self.persist();
    }

    /// Put back lines previously read from this store, undoing later
    /// mutations.
    pub(crate) fn restore(&mut self, lines: Vec<CartLine>) {
        if self.lines == lines {
            return;
        }
        self.lines = lines;
        debug!(cart_key = %self.key, "Restored cart lines");
        self.persist();
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        total_of(&self.lines)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        count_of(&self.lines)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self.lines.clone(),
            count: self.count(),
            total: self.total(),
        }
    }

    fn persist(&self) {
        let payload = match serde_json::to_string(&self.lines) {
            Ok(payload) => payload,
            Err(e) => {
                error!(cart_key = %self.key, error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.save(&self.key, &payload) {
            error!(cart_key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}

/// Decode a persisted payload, discarding it entirely if it is malformed or
/// breaks a cart invariant.
fn decode_lines(key: &CartKey, payload: &str) -> Vec<CartLine> {
    let lines: Vec<CartLine> = match serde_json::from_str(payload) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(cart_key = %key, error = %e, "Discarding malformed persisted cart");
            return Vec::new();
        }
    };

    let has_invalid_line = lines.iter().any(|line| !line.is_valid());
    let has_duplicate = lines.iter().enumerate().any(|(idx, line)| {
        lines
            .iter()
            .skip(idx + 1)
            .any(|other| other.item_id == line.item_id)
    });

    let total_overflows = checked_total_of(&lines).is_none();

    if has_invalid_line || has_duplicate || total_overflows {
        warn!(
            cart_key = %key,
            has_invalid_line,
            has_duplicate,
            total_overflows,
            "Discarding persisted cart that violates cart invariants"
        );
        return Vec::new();
    }

    lines
}
