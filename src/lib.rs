//! Cabas
//!
//! Cabas is the pricing and checkout engine of a TND retail storefront: cart
//! state, promotional price resolution, cagnotte (loyalty balance)
//! deduction, delivery fee estimation and the two-phase order submission
//! that reconciles the client's estimate with the server-confirmed total.
//!
//! The rendering layer, the product catalogue and the authentication
//! provider are external collaborators; this crate owns only the state and
//! arithmetic between them.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod delivery;
pub mod money;
pub mod order;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod session;
pub mod storage;
