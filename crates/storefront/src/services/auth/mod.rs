//! Authentication Gate.
//!
//! Holds who (if anyone) is signed in, and a one-shot [`PendingResumption`]
//! recording that a sign-in detour started from the middle of a checkout.
//! There is no credential backend: sign-in and sign-up always succeed once
//! the submitted form is well-formed.
//!
//! The resumption is only visible to the flow controller; sign-in and sign-up
//! forms never see it.

mod error;

pub use error::AuthError;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use marketstall_core::{CheckoutStage, Email, UserHandle};

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogInForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LogInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sign-up form data.
///
/// Implements `Debug` manually to redact the passwords.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("password_confirm", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

// =============================================================================
// Domain Types
// =============================================================================

/// Well-formed sign-in credentials.
#[derive(Debug)]
pub struct Credentials {
    email: Email,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }
}

impl TryFrom<&LogInForm> for Credentials {
    type Error = AuthError;

    fn try_from(form: &LogInForm) -> Result<Self, Self::Error> {
        let email = Email::parse(&form.email)?;
        if form.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        Ok(Self {
            email,
            password: SecretString::from(form.password.clone()),
        })
    }
}

/// Well-formed sign-up details.
#[derive(Debug)]
pub struct Registration {
    email: Email,
    password: SecretString,
    first_name: String,
    last_name: String,
}

impl Registration {
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.local_part().to_owned()
        } else {
            name.to_owned()
        }
    }
}

impl TryFrom<&SignUpForm> for Registration {
    type Error = AuthError;

    fn try_from(form: &SignUpForm) -> Result<Self, Self::Error> {
        let email = Email::parse(&form.email)?;
        if form.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        if form.password != form.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(Self {
            email,
            password: SecretString::from(form.password.clone()),
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
        })
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable handle, derived from the email address.
    pub handle: UserHandle,
    pub display_name: String,
    pub email: Email,
    pub signed_in_at: DateTime<Utc>,
}

impl Identity {
    fn new(email: &Email, display_name: String) -> Self {
        Self {
            handle: UserHandle::new(format!("u-{}", email.as_str().to_lowercase())),
            display_name,
            email: email.clone(),
            signed_in_at: Utc::now(),
        }
    }
}

/// "After the next successful sign-in, re-enter checkout at `target`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResumption {
    pub target: CheckoutStage,
}

// =============================================================================
// Gate
// =============================================================================

/// Identity state for one browser session.
///
/// `identity` is present exactly when the session is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGate {
    identity: Option<Identity>,
    pending: Option<PendingResumption>,
}

impl AuthGate {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Sign in. Always succeeds for well-formed credentials.
    pub fn log_in(&mut self, credentials: &Credentials) -> Identity {
        let identity = Identity::new(
            &credentials.email,
            credentials.email.local_part().to_owned(),
        );
        info!(handle = %identity.handle, "Signed in");
        self.identity = Some(identity.clone());
        identity
    }

    /// Create an account and sign in. Always succeeds for well-formed details.
    pub fn sign_up(&mut self, registration: &Registration) -> Identity {
        let identity = Identity::new(&registration.email, registration.display_name());
        info!(handle = %identity.handle, "Signed up");
        self.identity = Some(identity.clone());
        identity
    }

    /// Sign out. Also drops any pending resumption, so a later sign-in is
    /// treated as an ordinary one.
    pub fn log_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(handle = %identity.handle, "Signed out");
        }
        self.pending = None;
    }

    /// Record that the next successful sign-in should resume checkout.
    pub(crate) fn request_resumption(&mut self, target: CheckoutStage) {
        self.pending = Some(PendingResumption { target });
    }

    /// Consume the pending resumption, if any. At most one caller ever sees it.
    pub(crate) fn take_resumption(&mut self) -> Option<PendingResumption> {
        self.pending.take()
    }

    /// Drop a pending resumption without consuming it.
    pub(crate) fn cancel_resumption(&mut self) {
        if self.pending.take().is_some() {
            debug!("Dropped pending checkout resumption");
        }
    }

    #[must_use]
    pub const fn has_pending_resumption(&self) -> bool {
        self.pending.is_some()
    }
}
