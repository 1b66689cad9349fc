//! Cart route handlers.
//!
//! Cart keys are stored in the session and map to a cart in the durable
//! cart storage. Cart mutations go through `POST /api/actions`; this module
//! only reads.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use marketstall_core::CartKey;

use crate::cart::{CartStore, CartSummary};
use crate::error::Result;
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get this browser's cart key, creating and storing one on first use.
pub(crate) async fn cart_key(session: &Session) -> Result<CartKey> {
    if let Some(key) = session.get::<CartKey>(session_keys::CART_KEY).await? {
        return Ok(key);
    }

    let key = CartKey::new(Uuid::new_v4().simple().to_string());
    session.insert(session_keys::CART_KEY, &key).await?;
    tracing::debug!(cart_key = %key, "Assigned new cart key");
    Ok(key)
}

/// Load this browser's cart.
pub(crate) async fn load_cart(state: &AppState, session: &Session) -> Result<CartStore> {
    let key = cart_key(session).await?;
    Ok(CartStore::load(state.carts(), key))
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Cart lines with count and total.
#[instrument(skip(state, session))]
pub async fn summary(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    let cart = load_cart(&state, &session).await?;
    Ok(Json(cart.summary()))
}
