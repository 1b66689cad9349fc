//! Integration test support for Marketstall.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketstall-integration-tests
//! ```
//!
//! Nothing external is needed: the flow tests drive a [`FlowController`]
//! directly, and the API tests drive the axum router in-process with
//! `tower::ServiceExt::oneshot`, carrying the session cookie by hand.
//!
//! # Test Categories
//!
//! - `checkout_flow` - cart, checkout and sign-in detour through the controller
//! - `storefront_api` - the same journeys over HTTP

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use marketstall_core::CartKey;
use marketstall_storefront::cart::{CartStorage, CartStore, FileCartStorage, MemoryCartStorage};
use marketstall_storefront::catalog::InMemoryCatalog;
use marketstall_storefront::config::StorefrontConfig;
use marketstall_storefront::flow::{FlowController, FlowState};
use marketstall_storefront::routes;
use marketstall_storefront::state::AppState;

pub const DEFAULT_COUNTRY: &str = "United States";

// =============================================================================
// Flow Controller
// =============================================================================

/// Shared cart storage plus a way to build controllers over it, as successive
/// requests from one browser would.
pub struct FlowHarness {
    pub storage: Arc<MemoryCartStorage>,
    pub key: CartKey,
}

impl Default for FlowHarness {
    fn default() -> Self {
        Self {
            storage: Arc::new(MemoryCartStorage::new()),
            key: CartKey::new("integration-cart"),
        }
    }
}

impl FlowHarness {
    /// A controller over the persisted cart with the given navigation state.
    #[must_use]
    pub fn controller(&self, state: FlowState) -> FlowController {
        let storage: Arc<dyn CartStorage> = self.storage.clone();
        FlowController::new(
            Arc::new(InMemoryCatalog::demo()),
            CartStore::load(storage, self.key.clone()),
            state,
            DEFAULT_COUNTRY,
        )
    }

    /// A controller for a first visit.
    #[must_use]
    pub fn fresh(&self) -> FlowController {
        self.controller(FlowState::default())
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// A storefront app over a temporary cart directory and the demo catalog.
pub struct TestApp {
    router: Router,
    _cart_dir: TempDir,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let cart_dir = tempfile::tempdir().expect("Failed to create cart dir");
        let config = StorefrontConfig {
            cart_dir: cart_dir.path().to_path_buf(),
            ..StorefrontConfig::default()
        };
        let state = AppState::new(
            config,
            Arc::new(InMemoryCatalog::demo()),
            Arc::new(FileCartStorage::new(cart_dir.path())),
        );

        Self {
            router: routes::app(state),
            _cart_dir: cart_dir,
        }
    }

    /// A new browser with an empty cookie jar.
    #[must_use]
    pub fn browser(&self) -> Browser {
        Browser {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// One browser: a router handle plus the session cookie it has been given.
pub struct Browser {
    router: Router,
    cookie: Option<String>,
}

/// Status, headers and decoded body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    /// JSON body, or a JSON string for plain-text bodies.
    pub body: Value,
}

impl Browser {
    /// Send a request, remembering any session cookie the server sets.
    pub async fn send(&mut self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("Failed to build request"))
            .await
            .expect("Router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let value = set_cookie.to_str().expect("Set-Cookie is ASCII");
            self.cookie = value.split(';').next().map(str::to_owned);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn page(&mut self) -> TestResponse {
        self.get("/api/page").await
    }

    pub async fn cart(&mut self) -> TestResponse {
        self.get("/api/cart").await
    }

    /// Dispatch an action given as JSON.
    pub async fn act(&mut self, action: Value) -> TestResponse {
        self.send(Method::POST, "/api/actions", Some(action.to_string()))
            .await
    }

    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }
}

// =============================================================================
// Form Fixtures
// =============================================================================

#[must_use]
pub fn shipping_form() -> Value {
    json!({
        "email": "guest@example.com",
        "first_name": "Grace",
        "last_name": "Hopper",
        "street_address": "1 Harbor Rd",
        "city": "Arlington",
        "state": "VA",
        "postal_code": "22201",
        "phone": "555-0199"
    })
}

#[must_use]
pub fn payment_form() -> Value {
    json!({
        "cardholder_name": "Grace Hopper",
        "card_number": "4242 4242 4242 4242",
        "expiry": "09/30"
    })
}

#[must_use]
pub fn log_in_form() -> Value {
    json!({ "email": "member@example.com", "password": "correct horse" })
}
