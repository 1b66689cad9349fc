//! Checkout stage enum.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stage of a single purchase attempt.
///
/// Stages are ordered; the common path only moves forward:
///
/// ```text
/// Identity -> ShippingDetails -> Payment -> Review -> Complete
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    /// Choose between signing in, signing up and continuing as a guest.
    #[default]
    Identity,
    /// Collect contact and shipping address.
    ShippingDetails,
    /// Collect payment details.
    Payment,
    /// Final confirmation before the order is placed.
    Review,
    /// The order was placed.
    Complete,
}

impl CheckoutStage {
    /// The stage that follows this one, or `None` for `Complete`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::ShippingDetails),
            Self::ShippingDetails => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Whether being in this stage requires an established identity
    /// (a signed-in user or an explicit guest choice).
    #[must_use]
    pub const fn requires_identity(self) -> bool {
        !matches!(self, Self::Identity)
    }

    /// Whether this is the terminal stage.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Stable snake_case name, as used in serialized views and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::ShippingDetails => "shipping_details",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_the_whole_sequence() {
        let mut stage = CheckoutStage::Identity;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(stage, CheckoutStage::Complete);
    }

    #[test]
    fn test_only_identity_is_unguarded() {
        assert!(!CheckoutStage::Identity.requires_identity());
        assert!(CheckoutStage::ShippingDetails.requires_identity());
        assert!(CheckoutStage::Complete.requires_identity());
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for stage in [
            CheckoutStage::Identity,
            CheckoutStage::ShippingDetails,
            CheckoutStage::Payment,
            CheckoutStage::Review,
            CheckoutStage::Complete,
        ] {
            let json = serde_json::to_string(&stage).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }
}
