//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::flow::FlowError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// The flow controller refused an action.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Reading or writing the browser session failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Flow(err) => match err {
                FlowError::UnknownItem(_) => StatusCode::NOT_FOUND,
                FlowError::ItemUnavailable(_)
                | FlowError::EmptyCart
                | FlowError::NoActiveCheckout
                | FlowError::Checkout(
                    CheckoutError::InvalidTransition { .. } | CheckoutError::EmptyItemSet,
                ) => StatusCode::CONFLICT,
                FlowError::Checkout(CheckoutError::Validation(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                FlowError::Auth(_) => StatusCode::BAD_REQUEST,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Session(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request refused");
        }

        let status = self.status();
        let body = match &self {
            // Don't expose internal error details to clients
            Self::Session(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Flow(FlowError::Checkout(CheckoutError::Validation(errors))) => json!({
                "error": "Some fields need attention",
                "fields": errors.errors,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("flow", "add_to_cart", Some(&[("page", "listing")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketstall_core::{CheckoutStage, ItemId};

    use super::*;
    use crate::checkout::ValidationErrors;
    use crate::services::auth::AuthError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");

        let err = AppError::from(FlowError::UnknownItem(ItemId::new("p9")));
        assert_eq!(err.to_string(), "unknown item: p9");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(FlowError::UnknownItem(ItemId::new("p9")).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(FlowError::EmptyCart.into()), StatusCode::CONFLICT);
        assert_eq!(
            get_status(FlowError::NoActiveCheckout.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                FlowError::from(CheckoutError::InvalidTransition {
                    action: "go back",
                    stage: CheckoutStage::Payment,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                FlowError::from(CheckoutError::from(ValidationErrors::single(
                    "city",
                    "City is required"
                )))
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(FlowError::from(AuthError::MissingPassword).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let err = AppError::from(FlowError::from(CheckoutError::from(ValidationErrors::single(
            "city",
            "City is required",
        ))));
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["fields"][0]["field"], "city");
        assert_eq!(body["fields"][0]["message"], "City is required");
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response = AppError::Internal("disk on fire".to_string()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("disk on fire"));
    }
}
