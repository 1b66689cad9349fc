//! Core types for Marketstall.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod stage;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use stage::CheckoutStage;
