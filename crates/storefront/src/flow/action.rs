//! Actions a display page can trigger.

use serde::Deserialize;

use marketstall_core::ItemId;

use super::page::Destination;
use crate::checkout::{PaymentForm, ShippingForm};
use crate::services::auth::{LogInForm, SignUpForm};

const fn one() -> u32 {
    1
}

/// A user-triggered event, dispatched through
/// [`FlowController::dispatch`](super::FlowController::dispatch).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ViewListing {
        item_id: ItemId,
    },
    AddToCart {
        item_id: ItemId,
        #[serde(default = "one")]
        quantity: u32,
    },
    /// Zero or negative removes the line.
    SetQuantity {
        item_id: ItemId,
        quantity: i64,
    },
    RemoveFromCart {
        item_id: ItemId,
    },
    ViewCart,
    ProceedToCheckout,
    BuyNow {
        item_id: ItemId,
    },
    ContinueAsGuest,
    SignIn,
    SignUp,
    SubmitLogIn {
        form: LogInForm,
    },
    SubmitSignUp {
        form: SignUpForm,
    },
    LogOut,
    Back,
    BackToCart,
    SubmitShipping {
        form: ShippingForm,
    },
    SubmitPayment {
        form: PaymentForm,
    },
    PlaceOrder,
    Navigate {
        destination: Destination,
    },
}

impl Action {
    /// Short name for logs. Never includes form contents.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ViewListing { .. } => "view_listing",
            Self::AddToCart { .. } => "add_to_cart",
            Self::SetQuantity { .. } => "set_quantity",
            Self::RemoveFromCart { .. } => "remove_from_cart",
            Self::ViewCart => "view_cart",
            Self::ProceedToCheckout => "proceed_to_checkout",
            Self::BuyNow { .. } => "buy_now",
            Self::ContinueAsGuest => "continue_as_guest",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::SubmitLogIn { .. } => "submit_log_in",
            Self::SubmitSignUp { .. } => "submit_sign_up",
            Self::LogOut => "log_out",
            Self::Back => "back",
            Self::BackToCart => "back_to_cart",
            Self::SubmitShipping { .. } => "submit_shipping",
            Self::SubmitPayment { .. } => "submit_payment",
            Self::PlaceOrder => "place_order",
            Self::Navigate { .. } => "navigate",
        }
    }
}

/// Clamp a requested quantity into the cart's `u32` domain.
pub(crate) fn requested_quantity(quantity: i64) -> u32 {
    if quantity <= 0 {
        0
    } else {
        u32::try_from(quantity).unwrap_or(u32::MAX)
    }
}
