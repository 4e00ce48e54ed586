//! Cart
//!
//! The cart store holds the line items a checkout is priced from. It is the
//! single writer of cart state: every mutation recomputes line totals,
//! persists the envelope, and nothing else touches the storage keys.

use jiff::Timestamp;
use thiserror::Error;
use tracing::warn;

use crate::{
    money::{CURRENCY, Dinars, millimes},
    pricing,
    products::Product,
    promotions::ResolvedPrice,
    storage::{CART_KEY, KeyValueStore, StorageError, USE_CAGNOTTE_KEY},
};

mod records;

use records::StoredCart;

/// Maximum quantity a single cart line may carry.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors related to cart mutation or persistence.
#[derive(Debug, Error)]
pub enum CartError {
    /// An item's currency differs from the cart currency (product id, item
    /// currency, cart currency).
    #[error("item {0} has currency {1}, but the cart is priced in {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// An item was not found in the cart.
    #[error("item {0} not found")]
    ItemNotFound(String),

    /// Wrapped persistence error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One cart line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    id: String,
    name: String,
    unit_price_original: Dinars,
    unit_price_final: Dinars,
    quantity: u32,
    line_total: Dinars,
    is_promotion: bool,
    promo_id: Option<String>,
}

impl LineItem {
    /// Creates a line from a resolved price.
    #[must_use]
    pub fn from_resolved(product: &Product, resolved: &ResolvedPrice, quantity: u32) -> Self {
        Self::reconstitute(
            product.id.clone(),
            product.name.clone(),
            resolved.original_price,
            resolved.unit_price,
            quantity,
            resolved.is_promotion,
            resolved.promo_id.clone(),
        )
    }

    /// Creates an undiscounted line.
    #[must_use]
    pub fn full_price(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Dinars,
        quantity: u32,
    ) -> Self {
        Self::reconstitute(id.into(), name.into(), unit_price, unit_price, quantity, false, None)
    }

    pub(crate) fn reconstitute(
        id: String,
        name: String,
        unit_price_original: Dinars,
        unit_price_final: Dinars,
        quantity: u32,
        is_promotion: bool,
        promo_id: Option<String>,
    ) -> Self {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);

        let mut item = Self {
            id,
            name,
            unit_price_original,
            unit_price_final,
            quantity,
            line_total: millimes(0),
            is_promotion,
            promo_id,
        };
        item.recompute_total();

        item
    }

    fn recompute_total(&mut self) {
        self.line_total = millimes(
            self.unit_price_final.to_minor_units() * i64::from(self.quantity),
        );
    }

    /// Product identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Undiscounted unit price.
    #[must_use]
    pub fn unit_price_original(&self) -> Dinars {
        self.unit_price_original
    }

    /// Unit price the line is charged at.
    #[must_use]
    pub fn unit_price_final(&self) -> Dinars {
        self.unit_price_final
    }

    /// Units on this line; always between 1 and [`MAX_LINE_QUANTITY`].
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Line total; always `unit_price_final × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Dinars {
        self.line_total
    }

    /// Whether a promotion was applied when the line was priced.
    #[must_use]
    pub fn is_promotion(&self) -> bool {
        self.is_promotion
    }

    /// Identifier of the applied promotion, if any.
    #[must_use]
    pub fn promo_id(&self) -> Option<&str> {
        self.promo_id.as_deref()
    }
}

/// An aggregated view of the cart for checkout.
#[derive(Clone, Debug, PartialEq)]
pub struct CartSnapshot {
    /// Line items at snapshot time.
    pub items: Vec<LineItem>,

    /// Sum of line totals.
    pub subtotal: Dinars,

    /// Cagnotte amount the customer asked to spend.
    pub cagnotte_requested: Dinars,

    /// Cagnotte amount actually applied, after the ceiling rule.
    pub cagnotte_applied: Dinars,
}

/// The cart store.
#[derive(Debug)]
pub struct CartStore<S: KeyValueStore> {
    store: S,
    items: Vec<LineItem>,
    use_cagnotte: bool,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Loads the cart persisted in `store`.
    ///
    /// A missing, expired or unparseable envelope yields an empty cart; an
    /// unreadable store is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    pub fn load(store: S, now: Timestamp) -> Result<Self, StorageError> {
        let items = match store.get(CART_KEY)? {
            Some(raw) => match serde_json::from_str::<StoredCart>(&raw) {
                Ok(envelope) if !envelope.is_expired(now) => envelope.into_items(),
                Ok(_) => Vec::new(),
                Err(error) => {
                    warn!(%error, "discarding unparseable cart envelope");

                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let use_cagnotte = match store.get(USE_CAGNOTTE_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or(false),
            None => false,
        };

        Ok(Self {
            store,
            items,
            use_cagnotte,
        })
    }

    /// The current line items.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the customer asked to spend their cagnotte balance.
    #[must_use]
    pub fn use_cagnotte(&self) -> bool {
        self.use_cagnotte
    }

    /// Records whether the cagnotte balance should be spent at checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Storage`] if the flag cannot be persisted.
    pub fn set_use_cagnotte(&mut self, use_cagnotte: bool) -> Result<(), CartError> {
        self.use_cagnotte = use_cagnotte;

        let raw = serde_json::to_string(&use_cagnotte).map_err(StorageError::from)?;
        self.store.put(USE_CAGNOTTE_KEY, &raw)?;

        Ok(())
    }

    /// Adds `quantity` units of `product` priced at `resolved`.
    ///
    /// Adding a product already in the cart merges into the existing line,
    /// keeping that line's original pricing. Quantities clamp to
    /// [`MAX_LINE_QUANTITY`].
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::CurrencyMismatch`] if the resolved price is not
    /// in the cart currency, or a [`CartError::Storage`] if persisting fails.
    pub fn add(
        &mut self,
        product: &Product,
        resolved: &ResolvedPrice,
        quantity: u32,
        now: Timestamp,
    ) -> Result<&LineItem, CartError> {
        let item_currency = resolved.unit_price.currency();

        if item_currency != CURRENCY {
            return Err(CartError::CurrencyMismatch(
                product.id.clone(),
                item_currency.iso_alpha_code,
                CURRENCY.iso_alpha_code,
            ));
        }

        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .saturating_add(quantity)
                    .clamp(1, MAX_LINE_QUANTITY);
                item.recompute_total();
            }
            None => {
                self.items
                    .push(LineItem::from_resolved(product, resolved, quantity));
            }
        }

        self.persist(now)?;

        self.line(&product.id)
    }

    /// Sets the quantity of the line for `product_id`.
    ///
    /// A quantity outside `1..=MAX_LINE_QUANTITY` is rejected as a no-op: the
    /// line is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::ItemNotFound`] if no line matches, or a
    /// [`CartError::Storage`] if persisting fails.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: u32,
        now: Timestamp,
    ) -> Result<&LineItem, CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            warn!(%product_id, quantity, "rejecting out-of-range quantity update");

            return self.line(product_id);
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.to_owned()))?;

        item.quantity = quantity;
        item.recompute_total();

        self.persist(now)?;

        self.line(product_id)
    }

    /// Removes the line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::ItemNotFound`] if no line matches, or a
    /// [`CartError::Storage`] if persisting fails.
    pub fn remove(&mut self, product_id: &str, now: Timestamp) -> Result<(), CartError> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.to_owned()))?;

        self.items.remove(position);
        self.persist(now)?;

        Ok(())
    }

    /// Empties the cart and drops the persisted envelope and cagnotte flag.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Storage`] if the store cannot be written.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.use_cagnotte = false;
        self.store.remove(CART_KEY)?;
        self.store.remove(USE_CAGNOTTE_KEY)?;

        Ok(())
    }

    /// Builds the checkout snapshot against the customer's current cagnotte
    /// balance.
    ///
    /// When the cagnotte toggle is on, the requested deduction is the whole
    /// balance; the applied deduction is then clamped by the ceiling rule.
    #[must_use]
    pub fn snapshot(&self, cagnotte_balance: Dinars) -> CartSnapshot {
        let subtotal = pricing::subtotal(&self.items);

        let requested = if self.use_cagnotte {
            cagnotte_balance
        } else {
            millimes(0)
        };

        let applied = pricing::applied_cagnotte(requested, cagnotte_balance, subtotal);

        CartSnapshot {
            items: self.items.clone(),
            subtotal,
            cagnotte_requested: requested,
            cagnotte_applied: applied,
        }
    }

    fn line(&self, product_id: &str) -> Result<&LineItem, CartError> {
        self.items
            .iter()
            .find(|item| item.id == product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.to_owned()))
    }

    fn persist(&mut self, now: Timestamp) -> Result<(), StorageError> {
        let envelope = StoredCart::new(&self.items, now);
        let raw = serde_json::to_string(&envelope)?;

        self.store.put(CART_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{promotions::ResolvedPrice, storage::MemoryStore};

    use super::*;

    fn now() -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    fn empty_cart() -> Result<CartStore<MemoryStore>, StorageError> {
        CartStore::load(MemoryStore::new(), now())
    }

    fn product(id: &str, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), millimes(price))
    }

    fn list_price(product: &Product) -> ResolvedPrice {
        ResolvedPrice {
            unit_price: product.list_price,
            original_price: product.list_price,
            is_promotion: false,
            discount_percent: Decimal::ZERO,
            promo_id: None,
        }
    }

    #[test]
    fn add_creates_line_with_computed_total() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 4_200);

        let item = cart.add(&product, &list_price(&product), 3, now())?;

        assert_eq!(item.quantity(), 3);
        assert_eq!(item.line_total().to_minor_units(), 12_600);

        Ok(())
    }

    #[test]
    fn add_same_product_merges_quantities() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 4_200);

        cart.add(&product, &list_price(&product), 2, now())?;
        let item = cart.add(&product, &list_price(&product), 1, now())?;

        assert_eq!(item.quantity(), 3);
        assert_eq!(cart.items().len(), 1);

        Ok(())
    }

    #[test]
    fn set_quantity_below_one_is_a_no_op() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 4_200);

        cart.add(&product, &list_price(&product), 2, now())?;
        let item = cart.set_quantity("p-1", 0, now())?;

        assert_eq!(item.quantity(), 2, "quantity must be unchanged");

        Ok(())
    }

    #[test]
    fn set_quantity_above_maximum_is_a_no_op() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 4_200);

        cart.add(&product, &list_price(&product), 2, now())?;
        let item = cart.set_quantity("p-1", MAX_LINE_QUANTITY + 1, now())?;

        assert_eq!(item.quantity(), 2, "quantity must be unchanged");

        Ok(())
    }

    #[test]
    fn set_quantity_unknown_item_errors() -> TestResult {
        let mut cart = empty_cart()?;

        let result = cart.set_quantity("missing", 2, now());

        assert!(
            matches!(result, Err(CartError::ItemNotFound(id)) if id == "missing"),
            "expected ItemNotFound"
        );

        Ok(())
    }

    #[test]
    fn remove_then_item_is_gone() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 4_200);

        cart.add(&product, &list_price(&product), 1, now())?;
        cart.remove("p-1", now())?;

        assert!(cart.items().is_empty());

        Ok(())
    }

    #[test]
    fn cart_reloads_from_storage() -> TestResult {
        let mut store = MemoryStore::new();

        {
            let mut cart = CartStore::load(&mut store, now())?;
            let product = product("p-1", 4_200);
            cart.add(&product, &list_price(&product), 2, now())?;
            cart.set_use_cagnotte(true)?;
        }

        let reloaded = CartStore::load(&mut store, now())?;

        let item = reloaded.items().first().ok_or("cart came back empty")?;
        assert_eq!(item.quantity(), 2);
        assert!(reloaded.use_cagnotte());

        Ok(())
    }

    #[test]
    fn expired_envelope_loads_empty() -> TestResult {
        let mut store = MemoryStore::new();
        let stored: Timestamp = "2026-03-01T10:00:00Z".parse()?;
        let eight_days_later: Timestamp = "2026-03-09T10:00:01Z".parse()?;

        {
            let mut cart = CartStore::load(&mut store, stored)?;
            let product = product("p-1", 4_200);
            cart.add(&product, &list_price(&product), 2, stored)?;
        }

        let reloaded = CartStore::load(&mut store, eight_days_later)?;

        assert!(reloaded.items().is_empty(), "expired cart must load empty");

        Ok(())
    }

    #[test]
    fn snapshot_applies_ceiling_rule() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 10_000);

        cart.add(&product, &list_price(&product), 2, now())?;
        cart.set_use_cagnotte(true)?;

        let snapshot = cart.snapshot(millimes(50_000));

        assert_eq!(snapshot.subtotal.to_minor_units(), 20_000);
        assert_eq!(snapshot.cagnotte_requested.to_minor_units(), 50_000);
        assert_eq!(snapshot.cagnotte_applied.to_minor_units(), 20_000);

        Ok(())
    }

    #[test]
    fn snapshot_without_toggle_applies_nothing() -> TestResult {
        let mut cart = empty_cart()?;
        let product = product("p-1", 10_000);

        cart.add(&product, &list_price(&product), 2, now())?;

        let snapshot = cart.snapshot(millimes(50_000));

        assert_eq!(snapshot.cagnotte_applied.to_minor_units(), 0);

        Ok(())
    }

    #[test]
    fn clear_drops_items_and_flag() -> TestResult {
        let mut store = MemoryStore::new();

        {
            let mut cart = CartStore::load(&mut store, now())?;
            let product = product("p-1", 4_200);
            cart.add(&product, &list_price(&product), 1, now())?;
            cart.set_use_cagnotte(true)?;
            cart.clear()?;
        }

        assert_eq!(store.get(CART_KEY)?, None);
        assert_eq!(store.get(USE_CAGNOTTE_KEY)?, None);

        Ok(())
    }
}
