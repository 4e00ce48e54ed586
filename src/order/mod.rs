//! Order
//!
//! The two-phase order submission: `prepare` asks the order service to
//! authoritatively reprice the draft, `place` then submits with the
//! server-confirmed values, and the confirmation shown to the customer
//! carries those values, never the client estimate.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    cart::CartStore,
    checkout::{CheckoutWizard, ValidationError},
    money::Dinars,
    pricing,
    promotions::PromotionCache,
    session::Session,
    storage::KeyValueStore,
};

pub mod client;

pub use client::{
    DraftOrder, HttpOrderGateway, OrderGateway, OrderGatewayConfig, OrderGatewayError,
    OrderItemBody, PlacedOrder, PreparedTotals,
};

/// Errors raised while submitting an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The submission gate rejected the draft; corrected locally, never sent
    /// to the server.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The order service refused to prepare the draft. The draft is left
    /// intact for correction and retry; `place` was never attempted.
    #[error("order preparation rejected")]
    PrepareRejected(#[source] OrderGatewayError),

    /// Authentication expired between `prepare` and `place`. The customer
    /// must re-authenticate; the draft is preserved across that detour.
    #[error("authentication expired during order placement")]
    PlaceFailedAuth(#[source] OrderGatewayError),

    /// Placement failed for a retryable reason; the same draft may be
    /// resubmitted without re-entering anything.
    #[error("order placement failed")]
    PlaceFailedGeneric(#[source] OrderGatewayError),
}

/// The confirmation shown after a successful placement. All amounts are the
/// server-confirmed ones.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderConfirmation {
    /// Server-assigned order identifier.
    pub order_id: String,

    /// Total the order was placed at.
    pub server_total: Dinars,

    /// Confirmed delivery fee.
    pub server_delivery_fee: Dinars,

    /// Confirmed cagnotte deduction.
    pub server_cagnotte_deduction: Dinars,
}

/// Submits checkout drafts through the two-phase order service.
#[derive(Debug)]
pub struct OrderReconciler<G: OrderGateway> {
    gateway: G,
}

impl<G: OrderGateway> OrderReconciler<G> {
    /// Creates a reconciler over the given gateway.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Runs the full submission: gate check, `prepare`, `place`, then the
    /// success-only side effects.
    ///
    /// The cagnotte deduction is re-clamped here against the balance the
    /// session holds *now*, not the one captured when the cart was loaded;
    /// it can have changed on another device in between.
    ///
    /// Only after `place` succeeds: the session balance is debited by the
    /// confirmed deduction, the persisted cart and cagnotte flag are
    /// cleared, the client's promotion cache is invalidated, and the wizard
    /// reaches its terminal step.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`]; on any error the draft, cart and session
    /// are left untouched.
    pub async fn submit<S: KeyValueStore>(
        &self,
        wizard: &mut CheckoutWizard,
        cart: &mut CartStore<S>,
        session: &mut Session,
        promotions: &mut PromotionCache,
    ) -> Result<OrderConfirmation, OrderError> {
        wizard.submit_gate()?;

        let draft = wizard.draft();
        let snapshot = &draft.snapshot;

        let deduction = pricing::applied_cagnotte(
            snapshot.cagnotte_requested,
            session.cagnotte_balance(),
            snapshot.subtotal,
        );

        let order = DraftOrder::from_draft(draft, session.client_id(), deduction);

        let prepared = match self.gateway.prepare(session.bearer_token(), &order).await {
            Ok(prepared) => prepared,
            Err(cause) => {
                warn!(draft_id = %order.draft_id, %cause, "order preparation rejected");

                return Err(OrderError::PrepareRejected(cause));
            }
        };

        if prepared.total_amount.to_minor_units() != order.total_amount {
            info!(
                draft_id = %order.draft_id,
                client_estimate = order.total_amount,
                server_total = prepared.total_amount.to_minor_units(),
                "server repriced the draft; placing at the confirmed total"
            );
        }

        let confirmed = order.with_prepared(&prepared);

        let placed = match self.gateway.place(session.bearer_token(), &confirmed).await {
            Ok(placed) => placed,
            Err(cause) if cause.is_auth() => {
                warn!(draft_id = %confirmed.draft_id, "authentication expired mid-checkout");

                return Err(OrderError::PlaceFailedAuth(cause));
            }
            Err(cause) => {
                warn!(draft_id = %confirmed.draft_id, %cause, "order placement failed");

                return Err(OrderError::PlaceFailedGeneric(cause));
            }
        };

        session.debit_cagnotte(prepared.cagnotte_deduction);

        // The order exists now; a failed cleanup must not look like a failed
        // placement, or a retry would duplicate the order.
        if let Err(cause) = cart.clear() {
            error!(order_id = %placed.order_id, %cause, "placed order but could not clear cart");
        }

        promotions.invalidate(session.client_id());
        wizard.mark_submitted();

        info!(
            order_id = %placed.order_id,
            total = prepared.total_amount.to_minor_units(),
            "order placed"
        );

        Ok(OrderConfirmation {
            order_id: placed.order_id,
            server_total: prepared.total_amount,
            server_delivery_fee: prepared.delivery_fee,
            server_cagnotte_deduction: prepared.cagnotte_deduction,
        })
    }
}
