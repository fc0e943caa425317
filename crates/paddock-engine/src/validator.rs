//! Offer validation: the gate every submission passes before it reaches a
//! channel book.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. the channel must not be closed
//! 2. the channel must be enabled
//! 3. the price must be within `MIN_PRICE..=MAX_PRICE`
//!
//! Failures are ordinary outcomes ([`RejectReason`]), not errors.

use paddock_types::{OfferSubmission, RejectReason, validate_price};

use crate::registry::{ChannelRegistry, ChannelState};

/// Validates submissions against channel state and the price band.
pub struct OfferValidator {
    registry: ChannelRegistry,
}

impl OfferValidator {
    #[must_use]
    pub fn new(registry: ChannelRegistry) -> Self {
        Self { registry }
    }

    /// Check a submission. `Err` carries the reason it was turned away.
    pub fn validate(&self, submission: &OfferSubmission) -> Result<(), RejectReason> {
        match self.registry.channel_state(submission.channel_id) {
            ChannelState::Closed => return Err(RejectReason::ChannelClosed),
            ChannelState::NotEnabled => return Err(RejectReason::ChannelNotEnabled),
            ChannelState::Enabled => {}
        }
        validate_price(submission.price).map_err(|_| RejectReason::InvalidPrice {
            price: submission.price,
        })
    }
}
