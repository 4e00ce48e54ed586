//! Cabas prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartError, CartSnapshot, CartStore, LineItem, MAX_LINE_QUANTITY},
    checkout::{
        CheckoutDraft, CheckoutStep, CheckoutWizard, ContactInfo, PaymentMethod, ValidationError,
    },
    config::ServiceConfig,
    delivery::{
        Address, DeliveryRateService, DeliverySelection, FeeEstimator, GpsCoordinates,
        HttpDeliveryRateService, RateServiceError, acquire_coordinates,
    },
    money::{CURRENCY, Dinars, millimes},
    order::{
        HttpOrderGateway, OrderConfirmation, OrderError, OrderGateway, OrderGatewayError,
        OrderReconciler, PreparedTotals,
    },
    pricing::{applied_cagnotte, subtotal, total_payable},
    products::Product,
    promotions::{
        HttpPromotionsFeed, PromotionCache, PromotionRecord, PromotionsFeed, ResolvedPrice,
        feed::active_promotions, resolve,
    },
    session::Session,
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
};
