//! Service configuration module

use std::time::Duration;

use clap::Parser;

use crate::{
    delivery::RateServiceConfig, order::OrderGatewayConfig, promotions::feed::PromotionsFeedConfig,
};

/// Cabas storefront service configuration.
///
/// Loaded from CLI arguments and environment variables; timeouts default to
/// the values each call deserves: promotions are best-effort, placement is
/// worth waiting for.
#[derive(Debug, Parser)]
#[command(name = "cabas", about = "Cabas storefront checkout engine", long_about = None)]
pub struct ServiceConfig {
    /// Base URL of the storefront API.
    #[arg(long, env = "CABAS_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Timeout for promotion lookups, in seconds.
    #[arg(long, env = "CABAS_PROMOTIONS_TIMEOUT_SECS", default_value_t = 5)]
    pub promotions_timeout_secs: u64,

    /// Timeout for delivery fee quotes, in seconds.
    #[arg(long, env = "CABAS_DELIVERY_TIMEOUT_SECS", default_value_t = 10)]
    pub delivery_timeout_secs: u64,

    /// Timeout for order prepare/place calls, in seconds.
    #[arg(long, env = "CABAS_ORDER_TIMEOUT_SECS", default_value_t = 30)]
    pub order_timeout_secs: u64,

    /// Debounce window for fee re-estimation, in milliseconds.
    #[arg(long, env = "CABAS_FEE_DEBOUNCE_MS", default_value_t = 500)]
    pub fee_debounce_ms: i64,
}

impl ServiceConfig {
    /// Load configuration from environment and CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Configuration for the promotions feed client.
    #[must_use]
    pub fn promotions_feed(&self) -> PromotionsFeedConfig {
        PromotionsFeedConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.promotions_timeout_secs),
        }
    }

    /// Configuration for the delivery rate client.
    #[must_use]
    pub fn delivery_rates(&self) -> RateServiceConfig {
        RateServiceConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.delivery_timeout_secs),
        }
    }

    /// Configuration for the order gateway.
    #[must_use]
    pub fn order_gateway(&self) -> OrderGatewayConfig {
        OrderGatewayConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.order_timeout_secs),
        }
    }
}
