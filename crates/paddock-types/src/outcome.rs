//! Inbound submissions and the typed outcomes handed back to the messaging
//! collaborator.
//!
//! The collaborator turns these into reactions, replies and log lines; the
//! engine never formats user-visible text itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, OfferRef, OfferSide, Transaction, UserId};

/// A normalized `OfferSubmitted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSubmission {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub side: OfferSide,
    pub price: i64,
    /// The external message that carried the offer.
    pub offer_ref: OfferRef,
    pub submitted_at: DateTime<Utc>,
}

/// Why a submission was turned away before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Trading in the channel has been closed.
    ChannelClosed,
    /// The channel was never set up for trading.
    ChannelNotEnabled,
    /// Price outside the tradable range.
    InvalidPrice { price: i64 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelClosed => write!(f, "CHANNEL_CLOSED"),
            Self::ChannelNotEnabled => write!(f, "CHANNEL_NOT_ENABLED"),
            Self::InvalidPrice { price } => write!(f, "INVALID_PRICE({price})"),
        }
    }
}

/// Result of a submission that did not hit a persistence failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// No crossing offer; the offer now rests on the book.
    Queued,
    /// Matched, settled and durably recorded.
    Settled(Transaction),
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }

    /// The recorded transaction, if this outcome carries one.
    #[must_use]
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Settled(tx) => Some(tx),
            _ => None,
        }
    }
}
