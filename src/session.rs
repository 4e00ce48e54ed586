//! Session
//!
//! The authenticated customer context supplied by the storefront shell: a
//! bearer token, a client identity, and the cagnotte balance as the profile
//! service last reported it.

use crate::money::{Dinars, millimes};

/// An authenticated customer session.
#[derive(Clone, Debug)]
pub struct Session {
    client_id: String,
    bearer_token: String,
    cagnotte_balance: Dinars,
}

impl Session {
    /// Creates a session from the authentication provider's data.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        bearer_token: impl Into<String>,
        cagnotte_balance: Dinars,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            bearer_token: bearer_token.into(),
            cagnotte_balance,
        }
    }

    /// Client identity, used as the promotion cache key.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Bearer token for the order endpoints.
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// The balance as currently known. Checkout re-reads this at submission
    /// time; it is never captured early and reused.
    #[must_use]
    pub fn cagnotte_balance(&self) -> Dinars {
        self.cagnotte_balance
    }

    /// Replaces the balance with a fresh profile value.
    pub fn refresh_balance(&mut self, balance: Dinars) {
        self.cagnotte_balance = balance;
    }

    /// Debits the balance after a successful order placement, saturating at
    /// zero. The optimistic local update; the next profile refresh reports
    /// the authoritative value.
    pub fn debit_cagnotte(&mut self, amount: Dinars) {
        let remaining =
            (self.cagnotte_balance.to_minor_units() - amount.to_minor_units()).max(0);

        self.cagnotte_balance = millimes(remaining);
    }
}
