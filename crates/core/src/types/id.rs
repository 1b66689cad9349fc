//! Newtype IDs for type-safe entity references.
//!
//! Catalog items, user handles and cart keys are all strings on the wire.
//! Use the `define_id!` macro to wrap them so they cannot be mixed up.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use marketstall_core::define_id;
/// define_id!(ListingId);
/// define_id!(SellerId);
///
/// let listing = ListingId::new("p1");
/// let seller = SellerId::new("p1");
///
/// assert_eq!(listing.as_str(), seller.as_str());
/// // These are different types, so this won't compile:
/// // let _: ListingId = seller;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog item identifier, stable across catalog reloads.
define_id!(ItemId);
// Stable handle for a signed-in user.
define_id!(UserHandle);
// Durable-storage key under which one browser's cart is persisted.
define_id!(CartKey);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_inner() {
        let id = ItemId::new("p1");
        assert_eq!(id.to_string(), "p1");
        assert_eq!(id.as_str(), "p1");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CartKey::from("cart-abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cart-abc\"");

        let parsed: CartKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_ordering_follows_string_order() {
        let mut ids = vec![ItemId::new("p2"), ItemId::new("p10"), ItemId::new("p1")];
        ids.sort();
        assert_eq!(
            ids.iter().map(ItemId::as_str).collect::<Vec<_>>(),
            ["p1", "p10", "p2"]
        );
    }
}
