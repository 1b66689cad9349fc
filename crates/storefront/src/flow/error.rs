//! Flow controller errors.

use thiserror::Error;

use marketstall_core::ItemId;

use crate::checkout::CheckoutError;
use crate::services::auth::AuthError;

/// Why an action was refused. A refused action leaves all state untouched.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The catalog has no listing with this ID.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// The listing exists but has nothing left to sell.
    #[error("item is unavailable: {0}")]
    ItemUnavailable(ItemId),

    #[error("cart is empty")]
    EmptyCart,

    /// A checkout action arrived with no checkout in progress.
    #[error("no checkout in progress")]
    NoActiveCheckout,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
