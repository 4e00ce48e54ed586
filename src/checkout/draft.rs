//! Checkout draft

use serde::Serialize;
use uuid::Uuid;

use crate::{
    cart::CartSnapshot,
    delivery::DeliverySelection,
    money::{Dinars, zero},
    pricing,
};

/// Customer contact details collected at the first wizard step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    /// Customer name.
    pub name: String,

    /// Phone number.
    pub phone: String,

    /// Email, when given.
    pub email: Option<String>,
}

/// How the order will be paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pay the courier on delivery. The default, so the payment gate always
    /// has a value to pass on.
    #[default]
    CashOnDelivery,

    /// Pay online by card.
    CardOnline,
}

/// Everything collected across the wizard, priced client-side.
///
/// Created when checkout begins, mutated at each step, submitted once and
/// then superseded by the server's confirmation.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutDraft {
    /// Draft identity, sent with both order calls.
    pub draft_id: Uuid,

    /// Contact details.
    pub contact: ContactInfo,

    /// Delivery selection, once the customer has made one.
    pub delivery: Option<DeliverySelection>,

    /// Payment method.
    pub payment: PaymentMethod,

    /// Cart snapshot the draft is priced from.
    pub snapshot: CartSnapshot,

    /// Client-side delivery fee estimate.
    pub delivery_fee: Dinars,
}

impl CheckoutDraft {
    /// Starts a draft from a cart snapshot.
    #[must_use]
    pub fn new(snapshot: CartSnapshot) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            contact: ContactInfo::default(),
            delivery: None,
            payment: PaymentMethod::default(),
            snapshot,
            delivery_fee: zero(),
        }
    }

    /// The client-side estimate of the payable amount:
    /// `max(0, subtotal + delivery fee - applied cagnotte)`.
    ///
    /// Display-only until the order service confirms its own total.
    #[must_use]
    pub fn total_payable(&self) -> Dinars {
        pricing::total_payable(
            self.snapshot.subtotal,
            self.delivery_fee,
            self.snapshot.cagnotte_applied,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::money::millimes;

    use super::*;

    fn snapshot(subtotal: i64, applied: i64) -> CartSnapshot {
        CartSnapshot {
            items: Vec::new(),
            subtotal: millimes(subtotal),
            cagnotte_requested: millimes(applied),
            cagnotte_applied: millimes(applied),
        }
    }

    #[test]
    fn total_payable_combines_subtotal_fee_and_deduction() {
        let mut draft = CheckoutDraft::new(snapshot(250_000, 50_000));
        draft.delivery_fee = millimes(7_000);

        assert_eq!(draft.total_payable().to_minor_units(), 207_000);
    }

    #[test]
    fn total_payable_never_negative() {
        let draft = CheckoutDraft::new(snapshot(20_000, 50_000));

        assert_eq!(draft.total_payable().to_minor_units(), 0);
    }

    #[test]
    fn drafts_get_distinct_identities() {
        let a = CheckoutDraft::new(snapshot(0, 0));
        let b = CheckoutDraft::new(snapshot(0, 0));

        assert_ne!(a.draft_id, b.draft_id);
    }
}
