//! Checkout Session.
//!
//! A checkout session is one purchase attempt: a fixed set of items and the
//! stage the purchase has reached.
//!
//! ```text
//! Identity -> ShippingDetails -> Payment -> Review -> Complete
//! ```
//!
//! The item set is captured when the session starts. A cart checkout copies
//! the cart's lines at that moment; a buy-now checkout holds a single ad-hoc
//! line that never touches the cart. Later cart edits do not reach into an
//! existing session.
//!
//! Sessions only move forward, except `Back` from `ShippingDetails`, which
//! returns a guest to `Identity`. Abandoning is handled by the flow
//! controller dropping the session.

pub mod payment;
pub mod shipping;
pub mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use marketstall_core::{CheckoutStage, Price};

use crate::cart::{CartLine, count_of, total_of};

pub use payment::{PaymentForm, PaymentSummary};
pub use shipping::{ShippingAddress, ShippingForm};
pub use validation::{FieldError, ValidationErrors};

/// Errors from checkout stage transitions.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The action is not available at the current stage.
    #[error("cannot {action} at the {stage} stage")]
    InvalidTransition {
        action: &'static str,
        stage: CheckoutStage,
    },

    /// The submitted form failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A cart checkout was started with an empty cart.
    #[error("nothing to check out")]
    EmptyItemSet,
}

/// What a session is buying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ItemSet {
    /// Snapshot of the whole cart at the moment checkout began.
    Cart { lines: Vec<CartLine> },
    /// A single item bought directly from its listing.
    BuyNow { line: CartLine },
}

impl ItemSet {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        match self {
            Self::Cart { lines } => lines,
            Self::BuyNow { line } => std::slice::from_ref(line),
        }
    }

    /// Whether completing this purchase should empty the cart.
    #[must_use]
    pub const fn is_cart(&self) -> bool {
        matches!(self, Self::Cart { .. })
    }

    #[must_use]
    pub fn total(&self) -> Price {
        total_of(self.lines())
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        count_of(self.lines())
    }
}

/// Where `Back` from a checkout stage leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Stay in checkout at this stage.
    Stage(CheckoutStage),
    /// Leave checkout for the cart page.
    ExitToCart,
}

/// A placed order, shown on the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub number: String,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub item_count: u32,
    pub shipping: ShippingAddress,
    pub payment: PaymentSummary,
    pub guest: bool,
    pub from_cart: bool,
    pub placed_at: DateTime<Utc>,
}

/// One in-progress purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    id: Uuid,
    items: ItemSet,
    stage: CheckoutStage,
    guest: bool,
    shipping: Option<ShippingAddress>,
    payment: Option<PaymentSummary>,
    started_at: DateTime<Utc>,
}

impl CheckoutSession {
    fn start(items: ItemSet) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            items,
            stage: CheckoutStage::Identity,
            guest: false,
            shipping: None,
            payment: None,
            started_at: Utc::now(),
        };
        info!(
            checkout_id = %session.id,
            from_cart = session.items.is_cart(),
            item_count = session.items.count(),
            "Checkout started"
        );
        session
    }

    /// Start a checkout for a copy of the cart's current lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyItemSet` if `lines` is empty.
    pub fn from_cart(lines: Vec<CartLine>) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyItemSet);
        }
        Ok(Self::start(ItemSet::Cart { lines }))
    }

    /// Start a buy-now checkout for a single line.
    #[must_use]
    pub fn buy_now(line: CartLine) -> Self {
        Self::start(ItemSet::BuyNow { line })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn items(&self) -> &ItemSet {
        &self.items
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    /// Whether the shopper chose guest checkout for this session.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.guest
    }

    #[must_use]
    pub const fn shipping(&self) -> Option<&ShippingAddress> {
        self.shipping.as_ref()
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentSummary> {
        self.payment.as_ref()
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the session may be at its current stage given the caller's
    /// authentication state. Past `Identity` requires a signed-in user or an
    /// explicit guest choice.
    #[must_use]
    pub const fn identity_guard_holds(&self, authenticated: bool) -> bool {
        !self.stage.requires_identity() || authenticated || self.guest
    }

    fn require(&self, stage: CheckoutStage, action: &'static str) -> Result<(), CheckoutError> {
        if self.stage != stage {
            return Err(CheckoutError::InvalidTransition {
                action,
                stage: self.stage,
            });
        }
        Ok(())
    }

    /// `Identity -> ShippingDetails` as a guest.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` outside `Identity`.
    pub fn continue_as_guest(&mut self) -> Result<(), CheckoutError> {
        self.require(CheckoutStage::Identity, "continue as guest")?;
        self.guest = true;
        self.stage = CheckoutStage::ShippingDetails;
        debug!(checkout_id = %self.id, stage = %self.stage, "Continuing as guest");
        Ok(())
    }

    /// Force the session to `stage`. Used when a sign-in detour completes.
    pub(crate) fn resume_at(&mut self, stage: CheckoutStage) {
        debug!(checkout_id = %self.id, from = %self.stage, to = %stage, "Resuming checkout");
        self.stage = stage;
    }

    /// Return to `Identity`, forgetting any guest choice. Entered shipping
    /// and payment details are kept.
    pub(crate) fn revert_to_identity(&mut self) {
        self.stage = CheckoutStage::Identity;
        self.guest = false;
    }

    /// Step back from the current stage.
    ///
    /// From `Identity`, back leaves checkout. From `ShippingDetails`, a
    /// signed-in shopper leaves checkout (there is no identity to re-collect)
    /// while a guest returns to `Identity`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` from `Payment` onwards.
    pub fn back(&mut self, authenticated: bool) -> Result<BackOutcome, CheckoutError> {
        match self.stage {
            CheckoutStage::Identity => Ok(BackOutcome::ExitToCart),
            CheckoutStage::ShippingDetails if authenticated => Ok(BackOutcome::ExitToCart),
            CheckoutStage::ShippingDetails => {
                self.revert_to_identity();
                Ok(BackOutcome::Stage(CheckoutStage::Identity))
            }
            stage @ (CheckoutStage::Payment | CheckoutStage::Review | CheckoutStage::Complete) => {
                Err(CheckoutError::InvalidTransition {
                    action: "go back",
                    stage,
                })
            }
        }
    }

    /// `ShippingDetails -> Payment` on a valid shipping form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` with every violated field, or
    /// `CheckoutError::InvalidTransition` outside `ShippingDetails`. The
    /// session is unchanged on error.
    pub fn submit_shipping(
        &mut self,
        form: &ShippingForm,
        default_country: &str,
    ) -> Result<(), CheckoutError> {
        self.require(CheckoutStage::ShippingDetails, "submit shipping details")?;
        let address = form.validate(default_country)?;
        self.shipping = Some(address);
        self.stage = CheckoutStage::Payment;
        debug!(checkout_id = %self.id, stage = %self.stage, "Shipping details accepted");
        Ok(())
    }

    /// `Payment -> Review` on a valid payment form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` with every violated field, or
    /// `CheckoutError::InvalidTransition` outside `Payment`.
    pub fn submit_payment(&mut self, form: &PaymentForm) -> Result<(), CheckoutError> {
        self.require(CheckoutStage::Payment, "submit payment details")?;
        let summary = form.validate()?;
        self.payment = Some(summary);
        self.stage = CheckoutStage::Review;
        debug!(checkout_id = %self.id, stage = %self.stage, "Payment details accepted");
        Ok(())
    }

    /// `Review -> Complete`, producing the placed [`Order`].
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` outside `Review`, or if
    /// shipping or payment details are somehow absent.
    pub fn place_order(&mut self) -> Result<Order, CheckoutError> {
        self.require(CheckoutStage::Review, "place order")?;
        let (Some(shipping), Some(payment)) = (self.shipping.clone(), self.payment.clone()) else {
            return Err(CheckoutError::InvalidTransition {
                action: "place order without shipping and payment details",
                stage: self.stage,
            });
        };

        self.stage = CheckoutStage::Complete;
        let order = Order {
            number: order_number(self.id),
            lines: self.items.lines().to_vec(),
            total: self.items.total(),
            item_count: self.items.count(),
            shipping,
            payment,
            guest: self.guest,
            from_cart: self.items.is_cart(),
            placed_at: Utc::now(),
        };
        info!(
            checkout_id = %self.id,
            order_number = %order.number,
            total = %order.total,
            "Order placed"
        );
        Ok(order)
    }
}

fn order_number(id: Uuid) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("MS-{}", simple.get(..8).unwrap_or(&simple))
}
