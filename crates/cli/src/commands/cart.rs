//! Inspect and clear persisted carts.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use marketstall_core::CartKey;
use marketstall_storefront::cart::{CartStorage, CartStore};

use super::CommandError;

/// Print the cart stored under `key`.
///
/// Uses the same fail-safe load as the storefront, so a malformed cart shows
/// as empty.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn show(
    storage: Arc<dyn CartStorage>,
    key: &CartKey,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let cart = CartStore::load(storage, key.clone());

    if json {
        serde_json::to_writer_pretty(&mut *out, &cart.summary())?;
        writeln!(out)?;
        return Ok(());
    }

    if cart.is_empty() {
        writeln!(out, "Cart {key} is empty")?;
        return Ok(());
    }

    writeln!(out, "Cart {key}")?;
    for line in cart.lines() {
        writeln!(
            out,
            "  {:<8} {:<32} {:>3} x {:>10} = {:>10}",
            line.item_id().as_str(),
            line.snapshot().title,
            line.quantity(),
            line.unit_price().to_string(),
            line.subtotal().to_string(),
        )?;
    }
    writeln!(out, "  {} item(s), total {}", cart.count(), cart.total())?;
    Ok(())
}

/// Delete the cart stored under `key`.
///
/// # Errors
///
/// Returns an error if the storage backend fails or output cannot be written.
pub fn clear(
    storage: &dyn CartStorage,
    key: &CartKey,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    storage.remove(key)?;
    info!(cart_key = %key, "Cart removed");
    writeln!(out, "Cleared cart {key}")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketstall_core::ItemId;
    use marketstall_storefront::cart::{FileCartStorage, MemoryCartStorage};
    use marketstall_storefront::catalog::{Catalog, InMemoryCatalog};

    use super::*;

    fn seeded(storage: Arc<dyn CartStorage>, key: &CartKey) {
        let catalog = InMemoryCatalog::demo();
        let mut cart = CartStore::load(storage, key.clone());
        cart.add_item(&catalog.listing(&ItemId::new("p1")).unwrap(), 2);
        cart.add_item(&catalog.listing(&ItemId::new("p2")).unwrap(), 1);
    }

    #[test]
    fn test_show_lists_lines_and_total() {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let key = CartKey::new("abc123");
        seeded(Arc::clone(&storage), &key);

        let mut out = Vec::new();
        show(storage, &key, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Walnut side table"));
        assert!(text.contains("3 item(s), total $55.00"));
    }

    #[test]
    fn test_show_json() {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let key = CartKey::new("abc123");
        seeded(Arc::clone(&storage), &key);

        let mut out = Vec::new();
        show(storage, &key, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["count"], 3);
        assert_eq!(value["lines"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_show_missing_cart_is_empty() {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let mut out = Vec::new();
        show(storage, &CartKey::new("nobody"), false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Cart nobody is empty\n");
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn CartStorage> = Arc::new(FileCartStorage::new(dir.path()));
        let key = CartKey::new("abc123");
        seeded(Arc::clone(&storage), &key);
        assert!(storage.load(&key).unwrap().is_some());

        let mut out = Vec::new();
        clear(storage.as_ref(), &key, &mut out).unwrap();

        assert!(storage.load(&key).unwrap().is_none());
    }

    #[test]
    fn test_clear_rejects_bad_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCartStorage::new(dir.path());
        let mut out = Vec::new();
        let err = clear(&storage, &CartKey::new("../etc"), &mut out).unwrap_err();
        assert!(matches!(err, CommandError::Storage(_)));
    }
}
