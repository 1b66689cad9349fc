//! Flow Controller.
//!
//! The single authority over which page is shown and the only writer of
//! page-level state. Display pages hand it an [`Action`]; it applies the
//! action to the cart, the checkout session and the authentication gate,
//! then settles on the next [`Page`].
//!
//! # Sign-in detour
//!
//! Choosing "sign in" or "sign up" from a checkout at `Identity` records a
//! [`PendingResumption`](crate::services::auth::PendingResumption) and leaves
//! the checkout session untouched. The next successful sign-in takes the
//! resumption and re-enters checkout at its target stage. A sign-in with
//! nothing to resume lands on the landing page.
//!
//! # Identity guard
//!
//! A checkout past `Identity` needs either a signed-in user or an explicit
//! guest choice. After every action (and when rehydrating state) the
//! controller checks this and forces a violating session back to
//! `Identity`.

mod action;
mod error;
mod page;

pub use action::Action;
pub use error::FlowError;
pub use page::{CheckoutSummary, Destination, Page, PageBody, PageView, StaticPage};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use marketstall_core::{CheckoutStage, ItemId};

use crate::cart::{CartLine, CartStore};
use crate::catalog::{Catalog, Listing};
use crate::checkout::{BackOutcome, CheckoutSession};
use crate::services::auth::{AuthGate, Credentials, Registration};

/// Stage a sign-in detour resumes into.
const RESUME_STAGE: CheckoutStage = CheckoutStage::ShippingDetails;

/// Per-browser navigation state.
///
/// Serializable so the HTTP layer can keep it in the shopper's session
/// between requests. The cart lives separately in its own storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub page: Page,
    pub checkout: Option<CheckoutSession>,
    pub auth: AuthGate,
}

/// Applies actions to one shopper's state.
pub struct FlowController {
    catalog: Arc<dyn Catalog>,
    cart: CartStore,
    state: FlowState,
    default_country: String,
}

impl fmt::Debug for FlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("cart", &self.cart)
            .field("state", &self.state)
            .field("default_country", &self.default_country)
            .finish_non_exhaustive()
    }
}

impl FlowController {
    /// Wrap rehydrated state. A session that violates the identity guard is
    /// reverted before anything else sees it.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        cart: CartStore,
        mut state: FlowState,
        default_country: impl Into<String>,
    ) -> Self {
        enforce_identity_guard(&mut state);
        Self {
            catalog,
            cart,
            state,
            default_country: default_country.into(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> FlowState {
        self.state
    }

    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.state.page
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutSession> {
        self.state.checkout.as_ref()
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthGate {
        &self.state.auth
    }

    /// Apply one action.
    ///
    /// # Errors
    ///
    /// Returns a [`FlowError`] if the action is not possible right now or its
    /// form is invalid. Navigation, checkout and authentication state are
    /// left exactly as they were.
    #[instrument(skip_all, fields(action = action.name(), page = %self.state.page))]
    pub fn dispatch(&mut self, action: Action) -> Result<(), FlowError> {
        let mut next = self.state.clone();
        self.apply(&mut next, action)?;
        enforce_identity_guard(&mut next);

        if next.page != self.state.page {
            debug!(from = %self.state.page, to = %next.page, "Page changed");
        }
        self.state = next;
        Ok(())
    }

    /// Put the cart back to lines taken before a dispatch whose resulting
    /// state could not be saved.
    pub(crate) fn restore_cart(&mut self, lines: Vec<CartLine>) {
        self.cart.restore(lines);
    }

    fn apply(&mut self, next: &mut FlowState, action: Action) -> Result<(), FlowError> {
        match action {
            Action::ViewListing { item_id } => {
                self.require_listing(&item_id)?;
                leave_checkout(next);
                next.page = Page::Listing { item_id };
            }
            Action::AddToCart { item_id, quantity } => {
                let listing = self.require_listing(&item_id)?;
                if listing.available_quantity == 0 {
                    return Err(FlowError::ItemUnavailable(item_id));
                }
                leave_checkout(next);
                next.page = Page::Cart;
                self.cart.add_item(&listing, quantity);
            }
            Action::SetQuantity { item_id, quantity } => {
                self.cart
                    .set_quantity(&item_id, action::requested_quantity(quantity));
            }
            Action::RemoveFromCart { item_id } => {
                self.cart.remove_item(&item_id);
            }
            Action::ViewCart | Action::BackToCart => {
                leave_checkout(next);
                next.page = Page::Cart;
            }
            Action::ProceedToCheckout => {
                if self.cart.is_empty() {
                    return Err(FlowError::EmptyCart);
                }
                let session = CheckoutSession::from_cart(self.cart.lines().to_vec())?;
                begin_checkout(next, session);
            }
            Action::BuyNow { item_id } => {
                let listing = self.require_listing(&item_id)?;
                let line = CartLine::from_listing(&listing, 1)
                    .ok_or(FlowError::ItemUnavailable(item_id))?;
                begin_checkout(next, CheckoutSession::buy_now(line));
            }
            Action::ContinueAsGuest => {
                active_checkout(next)?.continue_as_guest()?;
                next.page = Page::Checkout;
            }
            Action::SignIn => open_auth_page(next, Page::SignIn),
            Action::SignUp => open_auth_page(next, Page::SignUp),
            Action::SubmitLogIn { form } => {
                let credentials = Credentials::try_from(&form)?;
                next.auth.log_in(&credentials);
                finish_authentication(next);
            }
            Action::SubmitSignUp { form } => {
                let registration = Registration::try_from(&form)?;
                next.auth.sign_up(&registration);
                finish_authentication(next);
            }
            Action::LogOut => log_out(next),
            Action::Back => back(next)?,
            Action::SubmitShipping { form } => {
                active_checkout(next)?.submit_shipping(&form, &self.default_country)?;
                next.page = Page::Checkout;
            }
            Action::SubmitPayment { form } => {
                active_checkout(next)?.submit_payment(&form)?;
                next.page = Page::Checkout;
            }
            Action::PlaceOrder => {
                let order = active_checkout(next)?.place_order()?;
                next.checkout = None;
                if order.from_cart {
                    self.cart.clear();
                }
                next.page = Page::OrderConfirmation {
                    order: Box::new(order),
                };
            }
            Action::Navigate { destination } => {
                leave_checkout(next);
                next.page = match destination {
                    Destination::Landing => Page::Landing,
                    Destination::Cart => Page::Cart,
                    Destination::Dashboard if next.auth.is_authenticated() => Page::Dashboard,
                    Destination::Profile if next.auth.is_authenticated() => Page::Profile,
                    Destination::Dashboard | Destination::Profile => Page::SignIn,
                    Destination::Static { page } => Page::Static { page },
                };
            }
        }
        Ok(())
    }

    fn require_listing(&self, item_id: &ItemId) -> Result<Listing, FlowError> {
        self.catalog
            .listing(item_id)
            .ok_or_else(|| FlowError::UnknownItem(item_id.clone()))
    }

    /// Render the current page.
    #[must_use]
    pub fn view(&self) -> PageView {
        PageView {
            signed_in_as: self
                .state
                .auth
                .identity()
                .map(|identity| identity.display_name.clone()),
            cart_count: self.cart.count(),
            body: self.body(),
        }
    }

    fn body(&self) -> PageBody {
        match &self.state.page {
            Page::Landing => self.landing(),
            Page::Listing { item_id } => match self.catalog.listing(item_id) {
                Some(listing) => PageBody::Listing {
                    quantity_in_cart: self.cart.line(item_id).map_or(0, CartLine::quantity),
                    listing,
                },
                None => {
                    warn!(item_id = %item_id, "Listing vanished from catalog, showing landing page");
                    self.landing()
                }
            },
            Page::Cart => self.cart_view(),
            Page::Checkout => self.checkout_view(),
            Page::SignIn => PageBody::SignIn,
            Page::SignUp => PageBody::SignUp,
            Page::OrderConfirmation { order } => PageBody::OrderConfirmation {
                order: order.clone(),
            },
            Page::Dashboard => match self.state.auth.identity() {
                Some(identity) => PageBody::Dashboard {
                    identity: identity.clone(),
                },
                None => PageBody::SignIn,
            },
            Page::Profile => match self.state.auth.identity() {
                Some(identity) => PageBody::Profile {
                    identity: identity.clone(),
                },
                None => PageBody::SignIn,
            },
            Page::Static { page } => PageBody::Static { page: *page },
        }
    }

    fn landing(&self) -> PageBody {
        PageBody::Landing {
            listings: self.catalog.listings(),
        }
    }

    fn cart_view(&self) -> PageBody {
        PageBody::Cart {
            cart: self.cart.summary(),
        }
    }

    fn checkout_view(&self) -> PageBody {
        let Some(session) = self.state.checkout.as_ref() else {
            warn!("Checkout page without an active checkout, showing cart");
            return self.cart_view();
        };

        let checkout = CheckoutSummary::from(session);
        match session.stage() {
            CheckoutStage::Identity => PageBody::CheckoutOptions { checkout },
            CheckoutStage::ShippingDetails => PageBody::Shipping {
                checkout,
                default_country: self.default_country.clone(),
            },
            CheckoutStage::Payment => PageBody::Payment { checkout },
            CheckoutStage::Review => PageBody::Review { checkout },
            CheckoutStage::Complete => {
                warn!(checkout_id = %session.id(), "Completed checkout still active, showing cart");
                self.cart_view()
            }
        }
    }
}

fn active_checkout(state: &mut FlowState) -> Result<&mut CheckoutSession, FlowError> {
    state.checkout.as_mut().ok_or(FlowError::NoActiveCheckout)
}

/// Drop the active checkout (if any) and any pending resumption.
fn leave_checkout(state: &mut FlowState) {
    if let Some(session) = state.checkout.take() {
        info!(checkout_id = %session.id(), stage = %session.stage(), "Checkout abandoned");
    }
    state.auth.cancel_resumption();
}

fn begin_checkout(state: &mut FlowState, mut session: CheckoutSession) {
    leave_checkout(state);
    // Nothing to collect at Identity for a signed-in shopper.
    if state.auth.is_authenticated() {
        session.resume_at(CheckoutStage::ShippingDetails);
    }
    state.checkout = Some(session);
    state.page = Page::Checkout;
}

fn open_auth_page(state: &mut FlowState, page: Page) {
    // Switching between sign-in and sign-up keeps the detour intact.
    if !state.page.is_auth() {
        let at_identity = state
            .checkout
            .as_ref()
            .is_some_and(|s| s.stage() == CheckoutStage::Identity);
        if at_identity {
            state.auth.request_resumption(RESUME_STAGE);
            debug!("Checkout paused for sign-in");
        } else {
            leave_checkout(state);
        }
    }
    state.page = page;
}

fn finish_authentication(state: &mut FlowState) {
    if let Some(resumption) = state.auth.take_resumption()
        && let Some(session) = state.checkout.as_mut()
    {
        session.resume_at(resumption.target);
        info!(checkout_id = %session.id(), stage = %session.stage(), "Checkout resumed after sign-in");
        state.page = Page::Checkout;
        return;
    }

    leave_checkout(state);
    state.page = Page::Landing;
}

fn log_out(state: &mut FlowState) {
    state.auth.log_out();

    if let Some(session) = state.checkout.as_mut()
        && !session.identity_guard_holds(false)
    {
        session.revert_to_identity();
        info!(checkout_id = %session.id(), "Signed out mid-checkout, back to identity stage");
    }

    if matches!(state.page, Page::Dashboard | Page::Profile) {
        state.page = Page::Landing;
    }
}

fn back(state: &mut FlowState) -> Result<(), FlowError> {
    match state.page {
        Page::Checkout => {
            let authenticated = state.auth.is_authenticated();
            if active_checkout(state)?.back(authenticated)? == BackOutcome::ExitToCart {
                leave_checkout(state);
                state.page = Page::Cart;
            }
        }
        Page::SignIn | Page::SignUp => {
            state.auth.cancel_resumption();
            state.page = if state.checkout.is_some() {
                Page::Checkout
            } else {
                Page::Landing
            };
        }
        _ => {
            leave_checkout(state);
            state.page = Page::Landing;
        }
    }
    Ok(())
}

fn enforce_identity_guard(state: &mut FlowState) {
    let authenticated = state.auth.is_authenticated();
    if let Some(session) = state.checkout.as_mut()
        && !session.identity_guard_holds(authenticated)
    {
        warn!(
            checkout_id = %session.id(),
            stage = %session.stage(),
            "Checkout past identity without sign-in or guest choice, reverting"
        );
        session.revert_to_identity();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketstall_core::{CartKey, Price};

    use super::*;
    use crate::cart::{CartStorage, MemoryCartStorage};
    use crate::catalog::InMemoryCatalog;
    use crate::checkout::{CheckoutError, PaymentForm, ShippingForm};
    use crate::services::auth::{LogInForm, SignUpForm};

    fn controller() -> FlowController {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let cart = CartStore::load(storage, CartKey::new("flow-test"));
        FlowController::new(
            Arc::new(InMemoryCatalog::demo()),
            cart,
            FlowState::default(),
            "United States",
        )
    }

    fn add(flow: &mut FlowController, id: &str, quantity: u32) {
        flow.dispatch(Action::AddToCart {
            item_id: ItemId::new(id),
            quantity,
        })
        .unwrap();
    }

    fn log_in() -> Action {
        Action::SubmitLogIn {
            form: LogInForm {
                email: "shopper@example.com".to_owned(),
                password: "pw".to_owned(),
            },
        }
    }

    fn shipping() -> Action {
        Action::SubmitShipping {
            form: ShippingForm {
                email: "shopper@example.com".to_owned(),
                first_name: "Sam".to_owned(),
                last_name: "Shopper".to_owned(),
                street_address: "9 Elm St".to_owned(),
                city: "Madison".to_owned(),
                state: "WI".to_owned(),
                postal_code: "53703".to_owned(),
                phone: "555-0142".to_owned(),
                ..ShippingForm::default()
            },
        }
    }

    fn payment() -> Action {
        Action::SubmitPayment {
            form: PaymentForm {
                cardholder_name: "Sam Shopper".to_owned(),
                card_number: "4111111111111111".to_owned(),
                expiry: "01/31".to_owned(),
            },
        }
    }

    fn stage(flow: &FlowController) -> CheckoutStage {
        flow.checkout().unwrap().stage()
    }

    #[test]
    fn test_guest_purchase_clears_cart() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        assert_eq!(stage(&flow), CheckoutStage::Identity);

        flow.dispatch(Action::ContinueAsGuest).unwrap();
        flow.dispatch(shipping()).unwrap();
        assert_eq!(stage(&flow), CheckoutStage::Payment);
        flow.dispatch(payment()).unwrap();
        flow.dispatch(Action::PlaceOrder).unwrap();

        assert_eq!(flow.cart().count(), 0);
        assert!(flow.checkout().is_none());
        let Page::OrderConfirmation { order } = flow.page() else {
            panic!("expected order confirmation");
        };
        assert!(order.guest);
        assert_eq!(order.total, Price::from_cents(2000));
    }

    #[test]
    fn test_buy_now_leaves_cart_alone() {
        let mut flow = controller();
        add(&mut flow, "p1", 2);
        let before = flow.cart().lines().to_vec();

        flow.dispatch(Action::BuyNow {
            item_id: ItemId::new("p2"),
        })
        .unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();
        flow.dispatch(shipping()).unwrap();
        flow.dispatch(payment()).unwrap();
        flow.dispatch(Action::PlaceOrder).unwrap();

        assert_eq!(flow.cart().lines(), before.as_slice());
        assert_eq!(flow.cart().total(), Price::from_cents(4000));
    }

    #[test]
    fn test_sign_in_detour_resumes_at_shipping() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        let checkout_id = flow.checkout().unwrap().id();

        flow.dispatch(Action::SignIn).unwrap();
        assert_eq!(flow.page(), &Page::SignIn);
        assert_eq!(flow.checkout().unwrap().id(), checkout_id);

        flow.dispatch(log_in()).unwrap();
        assert_eq!(flow.page(), &Page::Checkout);
        assert_eq!(stage(&flow), CheckoutStage::ShippingDetails);
        assert_eq!(flow.checkout().unwrap().id(), checkout_id);
        assert!(!flow.auth().has_pending_resumption());
    }

    #[test]
    fn test_sign_in_without_checkout_lands() {
        let mut flow = controller();
        flow.dispatch(Action::SignIn).unwrap();
        flow.dispatch(log_in()).unwrap();
        assert_eq!(flow.page(), &Page::Landing);
        assert!(flow.auth().is_authenticated());
    }

    #[test]
    fn test_switching_to_sign_up_keeps_detour() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::SignIn).unwrap();
        flow.dispatch(Action::SignUp).unwrap();

        flow.dispatch(Action::SubmitSignUp {
            form: SignUpForm {
                email: "new@example.com".to_owned(),
                password: "pw".to_owned(),
                password_confirm: "pw".to_owned(),
                ..SignUpForm::default()
            },
        })
        .unwrap();

        assert_eq!(flow.page(), &Page::Checkout);
        assert_eq!(stage(&flow), CheckoutStage::ShippingDetails);
    }

    #[test]
    fn test_navigating_away_drops_detour() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::SignIn).unwrap();

        flow.dispatch(Action::Navigate {
            destination: Destination::Static {
                page: StaticPage::Help,
            },
        })
        .unwrap();
        assert!(flow.checkout().is_none());
        assert!(!flow.auth().has_pending_resumption());

        flow.dispatch(Action::SignIn).unwrap();
        flow.dispatch(log_in()).unwrap();
        assert_eq!(flow.page(), &Page::Landing);
    }

    #[test]
    fn test_back_from_sign_in_returns_to_checkout_options() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::SignIn).unwrap();

        flow.dispatch(Action::Back).unwrap();

        assert_eq!(flow.page(), &Page::Checkout);
        assert_eq!(stage(&flow), CheckoutStage::Identity);
        assert!(!flow.auth().has_pending_resumption());
    }

    #[test]
    fn test_guest_back_returns_to_identity() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();

        flow.dispatch(Action::Back).unwrap();

        assert_eq!(flow.page(), &Page::Checkout);
        assert_eq!(stage(&flow), CheckoutStage::Identity);
    }

    #[test]
    fn test_authenticated_back_exits_to_cart() {
        let mut flow = controller();
        flow.dispatch(log_in()).unwrap();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        assert_eq!(stage(&flow), CheckoutStage::ShippingDetails);

        flow.dispatch(Action::Back).unwrap();

        assert_eq!(flow.page(), &Page::Cart);
        assert!(flow.checkout().is_none());
        assert_eq!(flow.cart().count(), 1);
    }

    #[test]
    fn test_back_at_payment_is_refused() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();
        flow.dispatch(shipping()).unwrap();
        let before = flow.state().clone();

        let err = flow.dispatch(Action::Back).unwrap_err();
        assert!(matches!(
            err,
            FlowError::Checkout(CheckoutError::InvalidTransition { .. })
        ));
        assert_eq!(flow.state(), &before);

        flow.dispatch(Action::BackToCart).unwrap();
        assert_eq!(flow.page(), &Page::Cart);
        assert!(flow.checkout().is_none());
    }

    #[test]
    fn test_invalid_shipping_reports_all_and_keeps_state() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();
        let before = flow.state().clone();

        let err = flow
            .dispatch(Action::SubmitShipping {
                form: ShippingForm {
                    first_name: "Sam".to_owned(),
                    last_name: "Shopper".to_owned(),
                    street_address: "9 Elm St".to_owned(),
                    state: "WI".to_owned(),
                    postal_code: "53703".to_owned(),
                    phone: "555-0142".to_owned(),
                    ..ShippingForm::default()
                },
            })
            .unwrap_err();

        let FlowError::Checkout(CheckoutError::Validation(errors)) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.fields(), ["email", "city"]);
        assert_eq!(flow.state(), &before);
    }

    #[test]
    fn test_log_out_mid_checkout_reverts_to_identity() {
        let mut flow = controller();
        flow.dispatch(log_in()).unwrap();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(shipping()).unwrap();
        assert_eq!(stage(&flow), CheckoutStage::Payment);

        flow.dispatch(Action::LogOut).unwrap();

        assert_eq!(stage(&flow), CheckoutStage::Identity);
        assert!(flow.checkout().unwrap().shipping().is_some());
        assert_eq!(flow.checkout().unwrap().items().count(), 1);
    }

    #[test]
    fn test_log_out_leaves_guest_checkout_alone() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();

        flow.dispatch(Action::LogOut).unwrap();

        assert_eq!(stage(&flow), CheckoutStage::ShippingDetails);
    }

    #[test]
    fn test_rehydrated_guard_violation_is_reverted() {
        let mut flow = controller();
        flow.dispatch(log_in()).unwrap();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();

        let mut state = flow.into_state();
        state.auth = AuthGate::default();

        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let flow = FlowController::new(
            Arc::new(InMemoryCatalog::demo()),
            CartStore::load(storage, CartKey::new("flow-test")),
            state,
            "United States",
        );
        assert_eq!(stage(&flow), CheckoutStage::Identity);
    }

    #[test]
    fn test_empty_cart_and_unknown_items() {
        let mut flow = controller();
        assert!(matches!(
            flow.dispatch(Action::ProceedToCheckout),
            Err(FlowError::EmptyCart)
        ));
        assert!(matches!(
            flow.dispatch(Action::ViewListing {
                item_id: ItemId::new("nope")
            }),
            Err(FlowError::UnknownItem(_))
        ));
        assert!(matches!(
            flow.dispatch(Action::BuyNow {
                item_id: ItemId::new("p5")
            }),
            Err(FlowError::ItemUnavailable(_))
        ));
        assert!(matches!(
            flow.dispatch(Action::ContinueAsGuest),
            Err(FlowError::NoActiveCheckout)
        ));
        assert_eq!(flow.page(), &Page::Landing);
    }

    #[test]
    fn test_set_quantity_non_positive_removes() {
        let mut flow = controller();
        add(&mut flow, "p2", 3);
        flow.dispatch(Action::SetQuantity {
            item_id: ItemId::new("p2"),
            quantity: -1,
        })
        .unwrap();
        assert!(flow.cart().is_empty());
    }

    #[test]
    fn test_checkout_views_follow_stage() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        assert!(matches!(
            flow.view().body,
            PageBody::CheckoutOptions { .. }
        ));

        flow.dispatch(Action::ContinueAsGuest).unwrap();
        let PageBody::Shipping {
            default_country, ..
        } = flow.view().body
        else {
            panic!("expected shipping view");
        };
        assert_eq!(default_country, "United States");

        flow.dispatch(shipping()).unwrap();
        assert!(matches!(flow.view().body, PageBody::Payment { .. }));
        flow.dispatch(payment()).unwrap();
        assert!(matches!(flow.view().body, PageBody::Review { .. }));
    }

    #[test]
    fn test_checkout_page_without_session_renders_cart() {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let flow = FlowController::new(
            Arc::new(InMemoryCatalog::demo()),
            CartStore::load(storage, CartKey::new("flow-test")),
            FlowState {
                page: Page::Checkout,
                ..FlowState::default()
            },
            "United States",
        );
        assert!(matches!(flow.view().body, PageBody::Cart { .. }));
    }

    #[test]
    fn test_dashboard_requires_sign_in() {
        let mut flow = controller();
        flow.dispatch(Action::Navigate {
            destination: Destination::Dashboard,
        })
        .unwrap();
        assert_eq!(flow.page(), &Page::SignIn);

        flow.dispatch(log_in()).unwrap();
        flow.dispatch(Action::Navigate {
            destination: Destination::Profile,
        })
        .unwrap();
        let view = flow.view();
        assert_eq!(view.signed_in_as.as_deref(), Some("shopper"));
        assert!(matches!(view.body, PageBody::Profile { .. }));

        flow.dispatch(Action::LogOut).unwrap();
        assert_eq!(flow.page(), &Page::Landing);
    }

    #[test]
    fn test_flow_state_survives_session_round_trip() {
        let mut flow = controller();
        add(&mut flow, "p1", 1);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::SignIn).unwrap();

        let json = serde_json::to_string(flow.state()).unwrap();
        let restored: FlowState = serde_json::from_str(&json).unwrap();
        assert_eq!(&restored, flow.state());

        flow.dispatch(Action::Navigate {
            destination: Destination::Static {
                page: StaticPage::Help,
            },
        })
        .unwrap();
        let json = serde_json::to_string(flow.state()).unwrap();
        let restored: FlowState = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.page,
            Page::Static {
                page: StaticPage::Help
            }
        );
        assert!(restored.checkout.is_none());
    }

    #[test]
    fn test_restore_cart_undoes_order_clearing() {
        let storage: Arc<dyn CartStorage> = Arc::new(MemoryCartStorage::new());
        let key = CartKey::new("restore");
        let build = |state: FlowState| {
            FlowController::new(
                Arc::new(InMemoryCatalog::demo()),
                CartStore::load(storage.clone(), key.clone()),
                state,
                "United States",
            )
        };

        let mut flow = build(FlowState::default());
        add(&mut flow, "p1", 2);
        flow.dispatch(Action::ProceedToCheckout).unwrap();
        flow.dispatch(Action::ContinueAsGuest).unwrap();
        flow.dispatch(shipping()).unwrap();
        flow.dispatch(payment()).unwrap();
        let saved_state = flow.state().clone();
        let before = flow.cart().lines().to_vec();

        flow.dispatch(Action::PlaceOrder).unwrap();
        assert!(flow.cart().is_empty());
        flow.restore_cart(before.clone());

        // The next request sees the old state and the old cart together.
        let flow = build(saved_state);
        assert_eq!(flow.cart().lines(), before.as_slice());
        assert_eq!(flow.checkout().unwrap().stage(), CheckoutStage::Review);
    }
}
