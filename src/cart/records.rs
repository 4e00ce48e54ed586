//! Cart persistence records
//!
//! Serde shapes written under the `"cart"` storage key. The envelope carries
//! the write timestamp; envelopes older than seven days load as an empty
//! cart.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::money::millimes;

use super::LineItem;

/// How long a persisted cart stays loadable.
pub(crate) const CART_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1_000;

/// The envelope persisted under [`crate::storage::CART_KEY`].
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredCart {
    pub stored_at: Timestamp,
    pub items: Vec<StoredLineItem>,
}

impl StoredCart {
    pub(crate) fn new(items: &[LineItem], now: Timestamp) -> Self {
        Self {
            stored_at: now,
            items: items.iter().map(StoredLineItem::from).collect(),
        }
    }

    pub(crate) fn is_expired(&self, now: Timestamp) -> bool {
        now.as_millisecond() - self.stored_at.as_millisecond() > CART_TTL_MS
    }

    pub(crate) fn into_items(self) -> Vec<LineItem> {
        self.items.into_iter().map(StoredLineItem::into_item).collect()
    }
}

/// A persisted line item; prices in millimes.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredLineItem {
    pub id: String,
    pub name: String,
    pub unit_price_original: i64,
    pub unit_price_final: i64,
    pub quantity: u32,
    pub is_promotion: bool,
    pub promo_id: Option<String>,
}

impl StoredLineItem {
    /// Rebuilds a line item. The line total is recomputed rather than
    /// trusted, so a tampered or stale record cannot break the
    /// `line_total == unit_price × quantity` invariant.
    fn into_item(self) -> LineItem {
        LineItem::reconstitute(
            self.id,
            self.name,
            millimes(self.unit_price_original),
            millimes(self.unit_price_final),
            self.quantity.max(1),
            self.is_promotion,
            self.promo_id,
        )
    }
}

impl From<&LineItem> for StoredLineItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id().to_owned(),
            name: item.name().to_owned(),
            unit_price_original: item.unit_price_original().to_minor_units(),
            unit_price_final: item.unit_price_final().to_minor_units(),
            quantity: item.quantity(),
            is_promotion: item.is_promotion(),
            promo_id: item.promo_id().map(str::to_owned),
        }
    }
}
