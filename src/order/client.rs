//! Order gateway client

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::LineItem,
    checkout::{CheckoutDraft, ContactInfo, PaymentMethod},
    delivery::DeliverySelection,
    money::{Dinars, millimes},
    pricing,
};

/// Errors that can occur when talking to the order service.
#[derive(Debug, Error)]
pub enum OrderGatewayError {
    /// An HTTP transport or serialization error occurred (timeouts
    /// included).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the caller's credentials.
    #[error("authentication rejected with status {status}")]
    AuthRejected {
        /// HTTP status (401 or 403).
        status: u16,
    },

    /// The service refused the request.
    #[error("order service rejected the request with status {status}: {body}")]
    Rejected {
        /// HTTP status.
        status: u16,

        /// Response body, kept for the user-facing message.
        body: String,
    },
}

impl OrderGatewayError {
    /// Whether this failure means the session's authentication has expired.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        match self {
            Self::AuthRejected { .. } => true,
            Self::Http(error) => matches!(
                error.status(),
                Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            ),
            Self::Rejected { .. } => false,
        }
    }
}

/// One order line, as the order service wants to see it. Prices in millimes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderItemBody {
    /// Product identifier.
    pub product_id: String,

    /// Display name.
    pub name: String,

    /// Unit price charged.
    pub unit_price: i64,

    /// Units on the line.
    pub quantity: u32,

    /// Line total.
    pub line_total: i64,

    /// Applied promotion, if any.
    pub promo_id: Option<String>,
}

impl From<&LineItem> for OrderItemBody {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.id().to_owned(),
            name: item.name().to_owned(),
            unit_price: item.unit_price_final().to_minor_units(),
            quantity: item.quantity(),
            line_total: item.line_total().to_minor_units(),
            promo_id: item.promo_id().map(str::to_owned),
        }
    }
}

/// The order payload sent to both `prepare` and `place`. Amounts in
/// millimes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DraftOrder {
    /// Draft identity.
    pub draft_id: Uuid,

    /// Customer identity.
    pub client_id: String,

    /// Contact details.
    pub contact: ContactInfo,

    /// Order lines.
    pub items: Vec<OrderItemBody>,

    /// Delivery selection.
    pub delivery: Option<DeliverySelection>,

    /// Payment method.
    pub payment_method: PaymentMethod,

    /// Cart subtotal.
    pub cart_subtotal: i64,

    /// Delivery fee.
    pub delivery_fee: i64,

    /// Applied cagnotte deduction.
    pub cagnotte_deduction: i64,

    /// Payable total.
    pub total_amount: i64,
}

impl DraftOrder {
    /// Builds the payload from a checkout draft, with the cagnotte deduction
    /// already re-validated against the current balance.
    #[must_use]
    pub fn from_draft(draft: &CheckoutDraft, client_id: &str, deduction: Dinars) -> Self {
        let subtotal = draft.snapshot.subtotal;
        let total = pricing::total_payable(subtotal, draft.delivery_fee, deduction);

        Self {
            draft_id: draft.draft_id,
            client_id: client_id.to_owned(),
            contact: draft.contact.clone(),
            items: draft.snapshot.items.iter().map(OrderItemBody::from).collect(),
            delivery: draft.delivery.clone(),
            payment_method: draft.payment,
            cart_subtotal: subtotal.to_minor_units(),
            delivery_fee: draft.delivery_fee.to_minor_units(),
            cagnotte_deduction: deduction.to_minor_units(),
            total_amount: total.to_minor_units(),
        }
    }

    /// Returns the payload for `place`: the client-side estimates replaced
    /// with the server-confirmed values from `prepare`.
    #[must_use]
    pub fn with_prepared(mut self, prepared: &PreparedTotals) -> Self {
        self.delivery_fee = prepared.delivery_fee.to_minor_units();
        self.cagnotte_deduction = prepared.cagnotte_deduction.to_minor_units();
        self.total_amount = prepared.total_amount.to_minor_units();

        self
    }
}

/// The totals the order service confirmed for a draft. Authoritative; the
/// client estimates are display-only once these exist.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedTotals {
    /// Total amount the order will be placed at.
    pub total_amount: Dinars,

    /// Confirmed delivery fee.
    pub delivery_fee: Dinars,

    /// Confirmed cagnotte deduction.
    pub cagnotte_deduction: Dinars,
}

/// The identifier assigned to a placed order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Server-assigned order identifier.
    pub order_id: String,
}

/// The two-phase order service.
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Asks the service to authoritatively recompute the draft's totals.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderGatewayError`] when the service rejects the draft
    /// or cannot be reached.
    async fn prepare(
        &self,
        bearer_token: &str,
        order: &DraftOrder,
    ) -> Result<PreparedTotals, OrderGatewayError>;

    /// Places the order.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderGatewayError`] when placement is rejected; callers
    /// distinguish authentication failures through
    /// [`OrderGatewayError::is_auth`].
    async fn place(
        &self,
        bearer_token: &str,
        order: &DraftOrder,
    ) -> Result<PlacedOrder, OrderGatewayError>;
}

/// Configuration for the order HTTP gateway.
#[derive(Debug, Clone)]
pub struct OrderGatewayConfig {
    /// Service base URL.
    pub base_url: String,

    /// Request timeout. Placement is the call worth waiting longest for.
    pub timeout: std::time::Duration,
}

/// HTTP client for `POST /order/prepare` and `POST /order/place`.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    config: OrderGatewayConfig,
    http: Client,
}

impl HttpOrderGateway {
    /// Creates a new gateway from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: OrderGatewayConfig) -> Result<Self, OrderGatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    async fn post(
        &self,
        path: &str,
        bearer_token: &str,
        order: &DraftOrder,
    ) -> Result<reqwest::Response, OrderGatewayError> {
        let url = format!("{}{path}", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer_token)
            .json(order)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(OrderGatewayError::AuthRejected {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(OrderGatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn prepare(
        &self,
        bearer_token: &str,
        order: &DraftOrder,
    ) -> Result<PreparedTotals, OrderGatewayError> {
        let response = self.post("/order/prepare", bearer_token, order).await?;
        let parsed: PrepareResponse = response.json().await?;

        Ok(PreparedTotals {
            total_amount: millimes(parsed.total_amount),
            delivery_fee: millimes(parsed.delivery_fee),
            cagnotte_deduction: millimes(parsed.cagnotte_deduction),
        })
    }

    async fn place(
        &self,
        bearer_token: &str,
        order: &DraftOrder,
    ) -> Result<PlacedOrder, OrderGatewayError> {
        let response = self.post("/order/place", bearer_token, order).await?;
        let parsed: PlaceResponse = response.json().await?;

        Ok(PlacedOrder {
            order_id: parsed.order_id,
        })
    }
}

/// Millimes on the wire.
#[derive(Debug, Deserialize)]
struct PrepareResponse {
    total_amount: i64,
    delivery_fee: i64,
    cagnotte_deduction: i64,
}

#[derive(Debug, Deserialize)]
struct PlaceResponse {
    /// Some deployments answer `id`, others `order_id`.
    #[serde(alias = "id")]
    order_id: String,
}
