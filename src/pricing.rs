//! Pricing
//!
//! The core basket arithmetic: subtotals, the cagnotte deduction ceiling and
//! the final payable amount. Everything here is pure integer math over
//! millimes, so it is computed identically on every call.

use crate::{
    cart::LineItem,
    money::{Dinars, millimes},
};

/// Calculates the subtotal of a list of line items.
///
/// The fold happens entirely in minor units; there is a single rounding
/// domain, so per-item rounding can never compound.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Dinars {
    millimes(
        items
            .iter()
            .map(|item| item.line_total().to_minor_units())
            .sum(),
    )
}

/// Calculates the cagnotte deduction actually applied for a checkout.
///
/// The deduction is capped three ways: by what the customer asked to spend,
/// by the balance they actually hold, and by the subtotal actually owed.
/// Negative inputs clamp to zero, so the result is never negative.
#[must_use]
pub fn applied_cagnotte(requested: Dinars, balance: Dinars, subtotal: Dinars) -> Dinars {
    let applied = requested
        .to_minor_units()
        .min(balance.to_minor_units())
        .min(subtotal.to_minor_units())
        .max(0);

    millimes(applied)
}

/// Calculates the final payable amount: `subtotal + delivery fee - deduction`,
/// floored at zero.
#[must_use]
pub fn total_payable(subtotal: Dinars, delivery_fee: Dinars, deduction: Dinars) -> Dinars {
    let total = subtotal.to_minor_units() + delivery_fee.to_minor_units()
        - deduction.to_minor_units();

    millimes(total.max(0))
}
