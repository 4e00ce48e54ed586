//! Delivery
//!
//! Delivery mode selection, the rules deciding when a fee can be estimated,
//! and the estimator that talks to the external rate service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod client;
pub mod estimator;

pub use client::{
    DeliveryRateService, FeeQuoteItem, FeeQuoteRequest, HttpDeliveryRateService,
    RateServiceConfig, RateServiceError,
};
pub use estimator::{FeeEstimator, RequestTicket};

/// How long to wait on the device before falling back to a fixed location.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// A structured delivery address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line.
    pub street: String,

    /// City.
    pub city: String,

    /// Region / governorate.
    pub region: String,

    /// Postal code, when known.
    pub postal_code: Option<String>,
}

impl Address {
    /// Whether the address carries enough structure to estimate a fee:
    /// street, city and region all non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let filled = |field: &str| !field.trim().is_empty();

        filled(&self.street) && filled(&self.city) && filled(&self.region)
    }
}

/// A GPS fix supplied by the device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,
}

impl GpsCoordinates {
    /// Whether this is a usable fix: both components finite and in range,
    /// and not the `(0, 0)` unset sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let finite = self.latitude.is_finite() && self.longitude.is_finite();
        let in_range = (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);
        #[expect(
            clippy::float_cmp,
            reason = "(0, 0) is an exact sentinel written by the device shim, never computed"
        )]
        let unset = self.latitude == 0.0 && self.longitude == 0.0;

        finite && in_range && !unset
    }
}

/// Where and how an order should be delivered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DeliverySelection {
    /// Ship to an address; the fee comes from the external rate service.
    Home {
        /// Chosen delivery mode id (standard, express, ...).
        mode_id: Option<u32>,

        /// Structured address, when entered.
        address: Option<Address>,

        /// Device GPS fix, when acquired.
        coordinates: Option<GpsCoordinates>,
    },

    /// Collect from a store; fixed zero fee.
    Pickup {
        /// Chosen store, when selected.
        store_id: Option<String>,
    },

    /// Collect from a relay point; fixed zero fee.
    Relay {
        /// Chosen relay point, when selected.
        relay_id: Option<String>,
    },
}

impl DeliverySelection {
    /// Whether enough has been selected to produce a fee: a complete address
    /// or a valid GPS fix for home delivery, a chosen point for pickup and
    /// relay.
    #[must_use]
    pub fn is_estimable(&self) -> bool {
        match self {
            Self::Home {
                address,
                coordinates,
                ..
            } => {
                let has_address = address.as_ref().is_some_and(Address::is_complete);
                let has_fix = coordinates.as_ref().is_some_and(GpsCoordinates::is_valid);

                has_address || has_fix
            }
            Self::Pickup { store_id } => store_id.is_some(),
            Self::Relay { relay_id } => relay_id.is_some(),
        }
    }

    /// Whether the fee must be fetched from the external rate service.
    /// Pickup and relay short-circuit to a fixed fee locally.
    #[must_use]
    pub fn needs_remote_estimate(&self) -> bool {
        matches!(self, Self::Home { .. })
    }
}

/// Waits for a device GPS fix, falling back to `fallback` if the device does
/// not answer within `timeout` or answers with an unusable fix. The wizard
/// never hangs on a permission prompt.
pub async fn acquire_coordinates<F>(
    acquisition: F,
    timeout: Duration,
    fallback: GpsCoordinates,
) -> GpsCoordinates
where
    F: Future<Output = Option<GpsCoordinates>>,
{
    match tokio::time::timeout(timeout, acquisition).await {
        Ok(Some(fix)) if fix.is_valid() => fix,
        _ => fallback,
    }
}
