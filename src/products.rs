//! Products

use crate::money::Dinars;

/// A catalogue product as supplied by the product data API.
///
/// Read-only input to price resolution; the crate never mutates products.
#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    /// Product identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Undiscounted list price.
    pub list_price: Dinars,
}

impl Product {
    /// Creates a new product.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, list_price: Dinars) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            list_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::money::millimes;

    use super::*;

    #[test]
    fn new_product_keeps_fields() {
        let product = Product::new("p-1", "Olive oil 1L", millimes(24_500));

        assert_eq!(product.id, "p-1");
        assert_eq!(product.name, "Olive oil 1L");
        assert_eq!(product.list_price.to_minor_units(), 24_500);
    }
}
