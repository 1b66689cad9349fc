//! Types stored outside the domain modules.

pub mod session;

pub use session::keys as session_keys;
