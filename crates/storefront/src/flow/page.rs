//! Page model.
//!
//! [`Page`] is what the flow controller says is on screen. [`PageView`] is
//! the data a display page needs to render it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marketstall_core::{CheckoutStage, ItemId, Price};

use crate::cart::{CartLine, CartSummary};
use crate::catalog::Listing;
use crate::checkout::{CheckoutSession, Order, PaymentSummary, ShippingAddress};
use crate::services::auth::Identity;

/// Informational pages with no state of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticPage {
    About,
    Help,
    Terms,
    Privacy,
}

/// The page currently shown to the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Page {
    #[default]
    Landing,
    Listing {
        item_id: ItemId,
    },
    Cart,
    /// Rendered according to the active checkout session's stage.
    Checkout,
    SignIn,
    SignUp,
    OrderConfirmation {
        order: Box<Order>,
    },
    Dashboard,
    Profile,
    Static {
        page: StaticPage,
    },
}

impl Page {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Listing { .. } => "listing",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::OrderConfirmation { .. } => "order_confirmation",
            Self::Dashboard => "dashboard",
            Self::Profile => "profile",
            Self::Static { .. } => "static",
        }
    }

    /// Whether this is one of the sign-in or sign-up pages.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::SignIn | Self::SignUp)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level navigation targets reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Destination {
    Landing,
    Cart,
    Dashboard,
    Profile,
    Static { page: StaticPage },
}

/// What a checkout page shows about the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub checkout_id: Uuid,
    pub stage: CheckoutStage,
    pub from_cart: bool,
    pub guest: bool,
    pub lines: Vec<CartLine>,
    pub count: u32,
    pub total: Price,
    pub shipping: Option<ShippingAddress>,
    pub payment: Option<PaymentSummary>,
}

impl From<&CheckoutSession> for CheckoutSummary {
    fn from(session: &CheckoutSession) -> Self {
        let items = session.items();
        Self {
            checkout_id: session.id(),
            stage: session.stage(),
            from_cart: items.is_cart(),
            guest: session.is_guest(),
            lines: items.lines().to_vec(),
            count: items.count(),
            total: items.total(),
            shipping: session.shipping().cloned(),
            payment: session.payment().cloned(),
        }
    }
}

/// Page-specific content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageBody {
    Landing {
        listings: Vec<Listing>,
    },
    Listing {
        listing: Listing,
        quantity_in_cart: u32,
    },
    Cart {
        cart: CartSummary,
    },
    /// Checkout at `Identity`: sign in, sign up, or continue as guest.
    CheckoutOptions {
        checkout: CheckoutSummary,
    },
    Shipping {
        checkout: CheckoutSummary,
        default_country: String,
    },
    Payment {
        checkout: CheckoutSummary,
    },
    Review {
        checkout: CheckoutSummary,
    },
    SignIn,
    SignUp,
    OrderConfirmation {
        order: Box<Order>,
    },
    Dashboard {
        identity: Identity,
    },
    Profile {
        identity: Identity,
    },
    Static {
        page: StaticPage,
    },
}

/// Everything a display page needs: the shared header plus its own body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// Display name of the signed-in user.
    pub signed_in_as: Option<String>,
    pub cart_count: u32,
    #[serde(flatten)]
    pub body: PageBody,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_serde_tags() {
        let page = Page::Listing {
            item_id: ItemId::new("p1"),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "listing", "item_id": "p1" }));

        let back: Page = serde_json::from_value(json).unwrap();
        assert_eq!(back, page);

        let page = Page::Static {
            page: StaticPage::Terms,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "static", "page": "terms" }));
    }

    #[test]
    fn test_destination_from_json() {
        let dest: Destination =
            serde_json::from_str(r#"{"to":"static","page":"privacy"}"#).unwrap();
        assert_eq!(
            dest,
            Destination::Static {
                page: StaticPage::Privacy
            }
        );
    }

    #[test]
    fn test_page_view_flattens_body() {
        let view = PageView {
            signed_in_as: None,
            cart_count: 2,
            body: PageBody::SignIn,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "sign_in");
        assert_eq!(json["cart_count"], 2);
    }

    #[test]
    fn test_auth_pages() {
        assert!(Page::SignIn.is_auth());
        assert!(Page::SignUp.is_auth());
        assert!(!Page::Checkout.is_auth());
        assert_eq!(Page::default().to_string(), "landing");
    }
}
