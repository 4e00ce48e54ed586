//! Fee estimator
//!
//! Wraps the rate service with the client-side policies the checkout needs:
//! a debounce window against rapid address edits, last-request-wins ordering
//! for in-flight quotes, and retention of the last good fee when the service
//! fails.

use jiff::Timestamp;
use tracing::{debug, warn};

use crate::{
    cart::LineItem,
    money::{Dinars, zero},
};

use super::{
    DeliverySelection,
    client::{DeliveryRateService, FeeQuoteItem, FeeQuoteRequest, RateServiceError},
};

/// Default debounce window against address edits.
pub const DEFAULT_DEBOUNCE_MS: i64 = 500;

/// Identity of one issued quote request. A response is only applied while its
/// ticket is still the newest one issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

/// The delivery fee estimator.
#[derive(Debug)]
pub struct FeeEstimator<R: DeliveryRateService> {
    service: R,
    debounce_ms: i64,
    generation: u64,
    last_input_at: Option<Timestamp>,
    fee: Option<Dinars>,
    calculating: bool,
    failed: bool,
}

impl<R: DeliveryRateService> FeeEstimator<R> {
    /// Creates an estimator with the default debounce window.
    #[must_use]
    pub fn new(service: R) -> Self {
        Self::with_debounce(service, DEFAULT_DEBOUNCE_MS)
    }

    /// Creates an estimator with the given debounce window in milliseconds.
    #[must_use]
    pub fn with_debounce(service: R, debounce_ms: i64) -> Self {
        Self {
            service,
            debounce_ms,
            generation: 0,
            last_input_at: None,
            fee: None,
            calculating: false,
            failed: false,
        }
    }

    /// Records an input edit (address keystroke, mode change) at `now`.
    ///
    /// [`refresh`](Self::refresh) stays quiet until the debounce window has
    /// elapsed since the most recent edit.
    pub fn note_input(&mut self, now: Timestamp) {
        self.last_input_at = Some(now);
    }

    /// Whether the debounce window has elapsed since the last recorded edit.
    #[must_use]
    pub fn debounce_elapsed(&self, now: Timestamp) -> bool {
        self.last_input_at.is_none_or(|at| {
            now.as_millisecond() - at.as_millisecond() >= self.debounce_ms
        })
    }

    /// Whether a quote request is currently outstanding.
    #[must_use]
    pub fn calculating(&self) -> bool {
        self.calculating
    }

    /// The last successfully computed fee, if any.
    #[must_use]
    pub fn fee(&self) -> Option<Dinars> {
        self.fee
    }

    /// Whether the most recent quote attempt failed. The last good fee is
    /// still available through [`fee`](Self::fee).
    #[must_use]
    pub fn has_failure(&self) -> bool {
        self.failed
    }

    /// Issues a new request ticket, superseding all earlier tickets.
    pub fn issue(&mut self) -> RequestTicket {
        self.generation += 1;
        self.calculating = true;

        RequestTicket {
            generation: self.generation,
        }
    }

    /// Applies the outcome of the request identified by `ticket`.
    ///
    /// Returns `false` when the ticket has been superseded; a stale outcome
    /// is discarded entirely so it can never overwrite a fresher fee.
    pub fn apply(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<Dinars, RateServiceError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded fee response"
            );

            return false;
        }

        self.calculating = false;

        match outcome {
            Ok(fee) => {
                self.fee = Some(fee);
                self.failed = false;
            }
            Err(error) => {
                warn!(%error, "fee estimate failed; keeping last known fee");
                self.failed = true;
            }
        }

        true
    }

    /// Re-estimates the fee for the current selection.
    ///
    /// No request is made while the selection is not estimable, while the
    /// debounce window is still open, or for pickup and relay selections,
    /// which short-circuit to a fixed zero fee. Returns the fee in effect
    /// afterwards.
    pub async fn refresh(
        &mut self,
        selection: &DeliverySelection,
        cart_total: Dinars,
        items: &[LineItem],
        now: Timestamp,
    ) -> Option<Dinars> {
        if !selection.is_estimable() {
            return self.fee;
        }

        if !selection.needs_remote_estimate() {
            self.fee = Some(zero());
            self.failed = false;

            return self.fee;
        }

        let DeliverySelection::Home {
            mode_id,
            address,
            coordinates,
        } = selection
        else {
            return self.fee;
        };

        let Some(mode_id) = mode_id else {
            return self.fee;
        };

        if !self.debounce_elapsed(now) {
            return self.fee;
        }

        let request = FeeQuoteRequest {
            mode_id: *mode_id,
            address: address.clone(),
            coordinates: *coordinates,
            cart_total,
            items: items.iter().map(FeeQuoteItem::from).collect(),
        };

        let ticket = self.issue();
        let outcome = self.service.quote(&request).await;
        self.apply(ticket, outcome);

        self.fee
    }
}
