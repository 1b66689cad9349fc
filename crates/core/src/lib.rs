//! Marketstall Core - Shared types library.
//!
//! This crate provides common types used across all Marketstall components:
//! - `storefront` - Cart, checkout and navigation state machines plus the HTTP surface
//! - `cli` - Command-line tools for inspecting persisted carts and the catalog
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and checkout stages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
