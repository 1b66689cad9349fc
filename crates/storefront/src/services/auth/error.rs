//! Authentication error types.

use thiserror::Error;

/// Errors turning a submitted sign-in or sign-up form into credentials.
///
/// Authentication itself always succeeds; only malformed forms fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketstall_core::EmailError),

    /// Password left blank.
    #[error("password is required")]
    MissingPassword,

    /// Sign-up password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}
