//! Checkout
//!
//! The checkout wizard: a finite sequence of steps with per-step validation
//! gates, forward and backward navigation, and a submission gate re-run from
//! the review step. The wizard is a plain state machine; it knows nothing
//! about rendering.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{cart::CartSnapshot, delivery::DeliverySelection};

mod draft;

pub use draft::{CheckoutDraft, ContactInfo, PaymentMethod};

/// Minimum contact name length accepted by the contact gate.
pub const MIN_CONTACT_NAME_LEN: usize = 3;

/// Minimum phone length accepted by the contact gate.
pub const MIN_PHONE_LEN: usize = 8;

/// A wizard gate rejected a transition. Local and recoverable; never sent to
/// the server.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Contact name shorter than [`MIN_CONTACT_NAME_LEN`].
    #[error("contact name must be at least {MIN_CONTACT_NAME_LEN} characters")]
    ContactNameTooShort,

    /// Phone shorter than [`MIN_PHONE_LEN`].
    #[error("phone number must be at least {MIN_PHONE_LEN} characters")]
    ContactPhoneTooShort,

    /// No delivery mode chosen yet.
    #[error("no delivery mode chosen")]
    DeliveryModeNotChosen,

    /// Home delivery without a complete address or usable coordinates.
    #[error("delivery address is incomplete and no usable coordinates were given")]
    DeliveryAddressIncomplete,

    /// Pickup without a chosen store.
    #[error("no pickup store selected")]
    PickupStoreNotChosen,

    /// Relay delivery without a chosen point.
    #[error("no relay point selected")]
    RelayPointNotChosen,

    /// `advance` called on the review step; the review step is exited by
    /// submitting.
    #[error("the review step is exited by submitting the order")]
    SubmitRequired,

    /// `submit` called before reaching the review step.
    #[error("cannot submit from the {0:?} step")]
    NotAtReview(CheckoutStep),

    /// The order has already been submitted.
    #[error("checkout already submitted")]
    AlreadySubmitted,
}

/// The wizard steps, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    /// Collect name and phone.
    ContactInfo,

    /// Choose a delivery mode and destination.
    Delivery,

    /// Choose a payment method.
    Payment,

    /// Review the priced order.
    Review,

    /// Terminal: the order was placed.
    Submitted,
}

/// The checkout wizard.
#[derive(Debug)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    completed: FxHashSet<CheckoutStep>,
    draft: CheckoutDraft,
}

impl CheckoutWizard {
    /// Begins a checkout from a cart snapshot.
    #[must_use]
    pub fn begin(snapshot: CartSnapshot) -> Self {
        Self {
            step: CheckoutStep::ContactInfo,
            completed: FxHashSet::default(),
            draft: CheckoutDraft::new(snapshot),
        }
    }

    /// The current step.
    #[must_use]
    pub fn current_step(&self) -> CheckoutStep {
        self.step
    }

    /// Steps already departed at least once. Progress display only; gates
    /// are always re-evaluated from the draft itself.
    #[must_use]
    pub fn completed_steps(&self) -> &FxHashSet<CheckoutStep> {
        &self.completed
    }

    /// The draft being assembled.
    #[must_use]
    pub fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    /// Mutable access to the draft, for step forms to fill in.
    pub fn draft_mut(&mut self) -> &mut CheckoutDraft {
        &mut self.draft
    }

    /// Checks the current step's gate without moving.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] the gate would reject the forward
    /// transition with.
    pub fn can_advance(&self) -> Result<(), ValidationError> {
        match self.step {
            CheckoutStep::ContactInfo => self.contact_gate(),
            CheckoutStep::Delivery => self.delivery_gate(),
            CheckoutStep::Payment => Ok(()),
            CheckoutStep::Review => Err(ValidationError::SubmitRequired),
            CheckoutStep::Submitted => Err(ValidationError::AlreadySubmitted),
        }
    }

    /// Advances to the next step when the current gate passes.
    ///
    /// # Errors
    ///
    /// Returns the gate's [`ValidationError`] and stays put when it fails.
    pub fn advance(&mut self) -> Result<CheckoutStep, ValidationError> {
        self.can_advance()?;

        let next = match self.step {
            CheckoutStep::ContactInfo => CheckoutStep::Delivery,
            CheckoutStep::Delivery => CheckoutStep::Payment,
            CheckoutStep::Payment => CheckoutStep::Review,
            // can_advance rejected these already.
            CheckoutStep::Review | CheckoutStep::Submitted => self.step,
        };

        self.completed.insert(self.step);
        self.step = next;

        Ok(self.step)
    }

    /// Steps backwards. Always permitted, never clears entered data, and a
    /// no-op on the first and terminal steps.
    pub fn retreat(&mut self) -> CheckoutStep {
        self.step = match self.step {
            CheckoutStep::ContactInfo | CheckoutStep::Submitted => self.step,
            CheckoutStep::Delivery => CheckoutStep::ContactInfo,
            CheckoutStep::Payment => CheckoutStep::Delivery,
            CheckoutStep::Review => CheckoutStep::Payment,
        };

        self.step
    }

    /// Re-runs every gate from the review step, as submission requires.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the failed gate; submission is
    /// blocked, never silently ignored.
    pub fn submit_gate(&self) -> Result<(), ValidationError> {
        match self.step {
            CheckoutStep::Review => {}
            CheckoutStep::Submitted => return Err(ValidationError::AlreadySubmitted),
            other => return Err(ValidationError::NotAtReview(other)),
        }

        self.contact_gate()?;
        self.delivery_gate()?;

        Ok(())
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.completed.insert(CheckoutStep::Review);
        self.step = CheckoutStep::Submitted;
    }

    fn contact_gate(&self) -> Result<(), ValidationError> {
        let contact = &self.draft.contact;

        if contact.name.trim().chars().count() < MIN_CONTACT_NAME_LEN {
            return Err(ValidationError::ContactNameTooShort);
        }

        if contact.phone.trim().chars().count() < MIN_PHONE_LEN {
            return Err(ValidationError::ContactPhoneTooShort);
        }

        Ok(())
    }

    fn delivery_gate(&self) -> Result<(), ValidationError> {
        let Some(selection) = &self.draft.delivery else {
            return Err(ValidationError::DeliveryModeNotChosen);
        };

        match selection {
            DeliverySelection::Home { mode_id, .. } => {
                if mode_id.is_none() {
                    return Err(ValidationError::DeliveryModeNotChosen);
                }

                if !selection.is_estimable() {
                    return Err(ValidationError::DeliveryAddressIncomplete);
                }

                Ok(())
            }
            DeliverySelection::Pickup { store_id } => {
                if store_id.is_none() {
                    return Err(ValidationError::PickupStoreNotChosen);
                }

                Ok(())
            }
            DeliverySelection::Relay { relay_id } => {
                if relay_id.is_none() {
                    return Err(ValidationError::RelayPointNotChosen);
                }

                Ok(())
            }
        }
    }
}
