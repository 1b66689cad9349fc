//! Page and action handlers.
//!
//! Each request rebuilds the shopper's [`FlowController`] from the session,
//! applies at most one action, and writes the resulting state back.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tower_sessions::Session;
use tracing::{instrument, warn};

use marketstall_core::UserHandle;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::flow::{Action, FlowController, FlowState, PageView};
use crate::models::session_keys;
use crate::services::auth::Identity;
use crate::state::AppState;

use super::cart::load_cart;

/// Rebuild the controller for this browser.
///
/// Unreadable flow state is discarded, like an unreadable cart.
async fn load_controller(state: &AppState, session: &Session) -> Result<FlowController> {
    let cart = load_cart(state, session).await?;
    let flow_state = match session.get::<FlowState>(session_keys::FLOW_STATE).await {
        Ok(flow_state) => flow_state.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable flow state");
            FlowState::default()
        }
    };

    Ok(FlowController::new(
        state.catalog(),
        cart,
        flow_state,
        state.config().default_country.clone(),
    ))
}

/// Keep the Sentry user in step with sign-in and sign-out.
fn sync_sentry_user(before: Option<&UserHandle>, after: Option<&Identity>) {
    match after {
        Some(identity) if before != Some(&identity.handle) => {
            set_sentry_user(&identity.handle, Some(identity.email.as_str()));
        }
        None if before.is_some() => clear_sentry_user(),
        _ => {}
    }
}

/// The current page.
#[instrument(skip(state, session))]
pub async fn page(State(state): State<AppState>, session: Session) -> Result<Json<PageView>> {
    let flow = load_controller(&state, &session).await?;
    Ok(Json(flow.view()))
}

/// Apply one action and return the page it leads to.
#[instrument(skip_all, fields(action = tracing::field::Empty))]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<Action>, JsonRejection>,
) -> Result<Json<PageView>> {
    let Json(action) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::Span::current().record("action", action.name());

    let mut flow = load_controller(&state, &session).await?;
    add_breadcrumb("flow", action.name(), Some(&[("page", flow.page().name())]));

    let before = flow.auth().identity().map(|identity| identity.handle.clone());
    let cart_before = flow.cart().lines().to_vec();
    flow.dispatch(action)?;

    // The cart is already written; undo it if the matching flow state can't be.
    if let Err(e) = session.insert(session_keys::FLOW_STATE, flow.state()).await {
        flow.restore_cart(cart_before);
        return Err(AppError::Internal(format!("failed to save flow state: {e}")));
    }

    sync_sentry_user(before.as_ref(), flow.auth().identity());
    Ok(Json(flow.view()))
}
