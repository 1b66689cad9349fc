//! Session-related types.

/// Session keys for per-browser state.
pub mod keys {
    /// Key for the serialized `FlowState` (page, checkout, sign-in state).
    pub const FLOW_STATE: &str = "flow_state";

    /// Key for the `CartKey` of this browser's durable cart.
    pub const CART_KEY: &str = "cart_key";
}
