//! Delivery rate service client

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::LineItem,
    money::{Dinars, millimes},
};

use super::{Address, GpsCoordinates};

/// Errors that can occur when requesting a fee quote.
#[derive(Debug, Error)]
pub enum RateServiceError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx response.
    #[error("unexpected response from delivery rate service: {0}")]
    UnexpectedResponse(String),
}

/// One cart line, as the rate service wants to see it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeeQuoteItem {
    /// Product identifier.
    pub product_id: String,

    /// Units on the line.
    pub quantity: u32,
}

impl From<&LineItem> for FeeQuoteItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.id().to_owned(),
            quantity: item.quantity(),
        }
    }
}

/// A fee quote request for a home delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeQuoteRequest {
    /// Chosen delivery mode id.
    pub mode_id: u32,

    /// Destination address, when entered.
    pub address: Option<Address>,

    /// Destination GPS fix, when the address is absent.
    pub coordinates: Option<GpsCoordinates>,

    /// Current cart total the fee is computed against.
    pub cart_total: Dinars,

    /// Cart contents.
    pub items: Vec<FeeQuoteItem>,
}

/// Source of delivery fee quotes.
#[automock]
#[async_trait]
pub trait DeliveryRateService: Send + Sync {
    /// Requests a fee quote for the given delivery.
    ///
    /// # Errors
    ///
    /// Returns a [`RateServiceError`] when the service cannot be reached or
    /// answers without a fee.
    async fn quote(&self, request: &FeeQuoteRequest) -> Result<Dinars, RateServiceError>;
}

/// Configuration for the delivery rate HTTP client.
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Service base URL.
    pub base_url: String,

    /// Request timeout.
    pub timeout: std::time::Duration,
}

/// HTTP client for `POST /delivery/fee`.
#[derive(Debug, Clone)]
pub struct HttpDeliveryRateService {
    config: RateServiceConfig,
    http: Client,
}

impl HttpDeliveryRateService {
    /// Creates a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: RateServiceConfig) -> Result<Self, RateServiceError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl DeliveryRateService for HttpDeliveryRateService {
    async fn quote(&self, request: &FeeQuoteRequest) -> Result<Dinars, RateServiceError> {
        let url = format!("{}/delivery/fee", self.config.base_url);
        let body = FeeQuoteBody::from(request);

        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(RateServiceError::UnexpectedResponse(format!(
                "fee request failed with status {status}: {text}"
            )));
        }

        let parsed: FeeResponse = response.json().await?;

        Ok(millimes(parsed.fee))
    }
}

#[derive(Debug, Serialize)]
struct FeeQuoteBody<'a> {
    mode_livraison_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_address: Option<&'a Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinates: Option<GpsCoordinates>,
    /// Millimes.
    cart_total: i64,
    cart_items: &'a [FeeQuoteItem],
}

impl<'a> From<&'a FeeQuoteRequest> for FeeQuoteBody<'a> {
    fn from(request: &'a FeeQuoteRequest) -> Self {
        Self {
            mode_livraison_id: request.mode_id,
            delivery_address: request.address.as_ref(),
            coordinates: request.coordinates,
            cart_total: request.cart_total.to_minor_units(),
            cart_items: &request.items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeeResponse {
    /// Millimes.
    fee: i64,
}
