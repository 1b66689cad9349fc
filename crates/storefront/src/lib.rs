//! Marketstall storefront library.
//!
//! The cart-to-checkout orchestration core ([`cart`], [`checkout`],
//! [`services::auth`], [`flow`]) plus the HTTP surface that exposes it
//! ([`routes`]). The core is synchronous and does no I/O beyond cart
//! persistence; the HTTP layer keeps one [`flow::FlowState`] per browser
//! session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod flow;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
