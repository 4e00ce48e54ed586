//! Money
//!
//! All amounts in this crate are Tunisian dinar (TND, 3 decimal places) and
//! are carried in minor units (millimes) so that summing never compounds
//! rounding error.

use rusty_money::{Money, iso};

/// The storefront currency. TND has an exponent of 3, matching the
/// millime-precision arithmetic used throughout.
pub const CURRENCY: &iso::Currency = iso::TND;

/// A TND amount.
pub type Dinars = Money<'static, iso::Currency>;

/// Creates a TND amount from millimes.
#[must_use]
pub fn millimes(amount: i64) -> Dinars {
    Money::from_minor(amount, CURRENCY)
}

/// Zero dinars.
#[must_use]
pub fn zero() -> Dinars {
    millimes(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millimes_round_trips_minor_units() {
        let amount = millimes(207_000);

        assert_eq!(amount.to_minor_units(), 207_000);
        assert_eq!(amount.currency(), CURRENCY);
    }

    #[test]
    fn zero_is_zero_millimes() {
        assert_eq!(zero().to_minor_units(), 0);
    }
}
