//! Promotions
//!
//! Promotion records fetched per client, the time-bounded cache that holds
//! them, and the price resolver that turns a product plus the active
//! promotion set into the unit price a cart line is created with.

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{money::Dinars, products::Product};

pub mod cache;
pub mod feed;

pub use cache::PromotionCache;
pub use feed::{HttpPromotionsFeed, PromotionsFeed, PromotionsFeedError};

/// A read-only promotion snapshot for a single product.
#[derive(Clone, Debug, PartialEq)]
pub struct PromotionRecord {
    /// Promotion identifier.
    pub promo_id: String,

    /// Product the promotion applies to.
    pub product_id: String,

    /// List price at the time the promotion was published.
    pub original_price: Dinars,

    /// Discounted unit price while the promotion is active.
    pub promo_price: Dinars,

    /// Advertised discount percentage, when the service supplies one.
    pub discount_percent: Option<Decimal>,

    /// Start of the validity window; open-ended when absent.
    pub valid_from: Option<Timestamp>,

    /// End of the validity window; open-ended when absent.
    pub valid_to: Option<Timestamp>,
}

impl PromotionRecord {
    /// Returns whether the promotion is active at `now`.
    ///
    /// Missing window bounds are treated as open.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        let started = self.valid_from.is_none_or(|from| from <= now);
        let not_ended = self.valid_to.is_none_or(|to| now <= to);

        started && not_ended
    }
}

/// The effective price for one unit of a product.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPrice {
    /// Price a cart line should be created with.
    pub unit_price: Dinars,

    /// Undiscounted list price, kept for display.
    pub original_price: Dinars,

    /// Whether a promotion was applied.
    pub is_promotion: bool,

    /// Percentage saved per unit; zero when no promotion applies.
    pub discount_percent: Decimal,

    /// Identifier of the applied promotion, if any.
    pub promo_id: Option<String>,
}

/// Resolves the effective unit price for `product` against the given
/// promotion set.
///
/// Pure over its arguments: the same product, promotions and instant always
/// produce the same result. When no record matches the product id, or the
/// matching record is outside its validity window, the list price is used
/// unchanged.
#[must_use]
pub fn resolve(
    product: &Product,
    promotions: &[PromotionRecord],
    now: Timestamp,
) -> ResolvedPrice {
    let active = promotions
        .iter()
        .find(|record| record.product_id == product.id && record.is_active(now));

    match active {
        Some(record) => ResolvedPrice {
            unit_price: record.promo_price,
            original_price: product.list_price,
            is_promotion: true,
            discount_percent: record
                .discount_percent
                .unwrap_or_else(|| percent_saved(product.list_price, record.promo_price)),
            promo_id: Some(record.promo_id.clone()),
        },
        None => ResolvedPrice {
            unit_price: product.list_price,
            original_price: product.list_price,
            is_promotion: false,
            discount_percent: Decimal::ZERO,
            promo_id: None,
        },
    }
}

/// Percentage saved per unit, rounded to one decimal place.
fn percent_saved(list_price: Dinars, promo_price: Dinars) -> Decimal {
    let list = list_price.to_minor_units();
    let promo = promo_price.to_minor_units();

    if list <= 0 {
        return Decimal::ZERO;
    }

    let saved = Decimal::from((list - promo).max(0)) * Decimal::from(100);

    (saved / Decimal::from(list)).round_dp(1)
}
