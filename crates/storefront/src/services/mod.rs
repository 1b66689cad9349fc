//! Session-scoped services.
//!
//! - `auth` - Authentication Gate (identity plus the one-shot checkout resumption)

pub mod auth;
