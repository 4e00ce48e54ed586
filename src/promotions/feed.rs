//! Promotions feed
//!
//! HTTP client for the promotions endpoint, plus the fetch-through-cache
//! helper the price resolver relies on. An unreachable feed degrades to an
//! empty promotion set so pricing falls back to list prices instead of
//! failing.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::money::millimes;

use super::{PromotionCache, PromotionRecord};

/// Errors that can occur when fetching promotions.
#[derive(Debug, Error)]
pub enum PromotionsFeedError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx response.
    #[error("unexpected response from promotions service: {0}")]
    UnexpectedResponse(String),
}

/// Source of per-client promotion records.
#[automock]
#[async_trait]
pub trait PromotionsFeed: Send + Sync {
    /// Fetches the promotion records currently published for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionsFeedError`] when the service cannot be reached
    /// or answers with something other than a promotion list.
    async fn promotions(&self, client_id: &str)
    -> Result<Vec<PromotionRecord>, PromotionsFeedError>;
}

/// Configuration for the promotions HTTP client.
#[derive(Debug, Clone)]
pub struct PromotionsFeedConfig {
    /// Service base URL, e.g. `"https://api.example.tn"`.
    pub base_url: String,

    /// Request timeout.
    pub timeout: std::time::Duration,
}

/// HTTP client for `GET /promotions?client_id=`.
#[derive(Debug, Clone)]
pub struct HttpPromotionsFeed {
    config: PromotionsFeedConfig,
    http: Client,
}

impl HttpPromotionsFeed {
    /// Creates a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: PromotionsFeedConfig) -> Result<Self, PromotionsFeedError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl PromotionsFeed for HttpPromotionsFeed {
    async fn promotions(
        &self,
        client_id: &str,
    ) -> Result<Vec<PromotionRecord>, PromotionsFeedError> {
        let url = format!("{}/promotions", self.config.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("client_id", client_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PromotionsFeedError::UnexpectedResponse(format!(
                "promotions request failed with status {status}: {text}"
            )));
        }

        let groups: Vec<PromotionGroup> = response.json().await?;

        Ok(flatten_groups(groups))
    }
}

/// Returns the active promotion set for `client_id`, consulting the cache
/// first and falling back to an empty set when the feed is unreachable.
///
/// Pricing availability takes priority over promotion accuracy, so feed
/// failures are logged and swallowed here rather than surfaced to callers.
pub async fn active_promotions(
    cache: &mut PromotionCache,
    feed: &dyn PromotionsFeed,
    client_id: &str,
    now: Timestamp,
) -> Vec<PromotionRecord> {
    if let Some(records) = cache.get(client_id, now) {
        return records.to_vec();
    }

    match feed.promotions(client_id).await {
        Ok(records) => {
            cache.insert(client_id, records.clone(), now);

            records
        }
        Err(error) => {
            warn!(%client_id, %error, "promotion fetch failed; pricing at list price");

            Vec::new()
        }
    }
}

// Wire shapes: the endpoint groups pivot pricing under each promotion.

#[derive(Debug, Deserialize)]
struct PromotionGroup {
    promotion: WirePromotion,
    products: Vec<WirePromotedProduct>,
}

#[derive(Debug, Deserialize)]
struct WirePromotion {
    id: String,
    discount_percent: Option<Decimal>,
    valid_from: Option<Timestamp>,
    valid_to: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct WirePromotedProduct {
    id: String,
    /// Millimes.
    original_price: i64,
    /// Millimes.
    promo_price: i64,
}

fn flatten_groups(groups: Vec<PromotionGroup>) -> Vec<PromotionRecord> {
    groups
        .into_iter()
        .flat_map(|group| {
            let promotion = group.promotion;

            group
                .products
                .into_iter()
                .map(move |product| PromotionRecord {
                    promo_id: promotion.id.clone(),
                    product_id: product.id,
                    original_price: millimes(product.original_price),
                    promo_price: millimes(product.promo_price),
                    discount_percent: promotion.discount_percent,
                    valid_from: promotion.valid_from,
                    valid_to: promotion.valid_to,
                })
        })
        .collect()
}
