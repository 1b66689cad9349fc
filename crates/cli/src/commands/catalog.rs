//! List catalog listings.

use std::io::Write;

use marketstall_storefront::catalog::Catalog;

use super::CommandError;

/// Print every listing with its price and availability.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn list(catalog: &dyn Catalog, out: &mut impl Write) -> Result<(), CommandError> {
    let listings = catalog.listings();
    for listing in &listings {
        writeln!(
            out,
            "{:<8} {:<32} {:>10} {:>4} available  {}",
            listing.id.as_str(),
            listing.title,
            listing.price.to_string(),
            listing.available_quantity,
            listing.location,
        )?;
    }
    writeln!(out, "{} listing(s)", listings.len())?;
    Ok(())
}
