//! Offer types for the Paddock engine.
//!
//! An [`Offer`] is validated when it is built. After that the only field that
//! ever changes is `active`, and it changes exactly once.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, OfferRef, OfferSubmission, PaddockError, Result, UserId, constants};

/// Which side of the book this offer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSide {
    Buy,
    Sell,
}

impl OfferSide {
    /// The side an offer must be on to trade against this one.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OfferSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OfferSide {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(PaddockError::InvalidSide(s.to_string())),
        }
    }
}

/// Check that a price is inside the tradable range.
pub fn validate_price(price: i64) -> Result<()> {
    if (constants::MIN_PRICE..=constants::MAX_PRICE).contains(&price) {
        Ok(())
    } else {
        Err(PaddockError::InvalidPrice {
            price,
            min: constants::MIN_PRICE,
            max: constants::MAX_PRICE,
        })
    }
}

/// A standing proposal to buy or sell at a fixed price within one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    id: OfferRef,
    user_id: UserId,
    channel_id: ChannelId,
    side: OfferSide,
    price: i64,
    active: bool,
    created_at: DateTime<Utc>,
    /// Process-wide arrival counter; breaks ties between equal timestamps.
    sequence: u64,
}

impl Offer {
    /// Build an active offer, rejecting out-of-range prices.
    pub fn new(
        id: OfferRef,
        user_id: UserId,
        channel_id: ChannelId,
        side: OfferSide,
        price: i64,
        created_at: DateTime<Utc>,
        sequence: u64,
    ) -> Result<Self> {
        validate_price(price)?;
        Ok(Self {
            id,
            user_id,
            channel_id,
            side,
            price,
            active: true,
            created_at,
            sequence,
        })
    }

    /// Build an offer from an inbound submission.
    pub fn from_submission(submission: &OfferSubmission, sequence: u64) -> Result<Self> {
        Self::new(
            submission.offer_ref,
            submission.user_id,
            submission.channel_id,
            submission.side,
            submission.price,
            submission.submitted_at,
            sequence,
        )
    }

    #[must_use]
    pub fn id(&self) -> OfferRef {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    #[must_use]
    pub fn side(&self) -> OfferSide {
        self.side
    }

    #[must_use]
    pub fn price(&self) -> i64 {
        self.price
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Time-priority key: earlier submissions sort first.
    #[must_use]
    pub fn time_priority(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.sequence)
    }

    /// Whether this resting offer can trade against an incoming offer at
    /// `incoming_price` on the opposite side.
    #[must_use]
    pub fn is_matchable_at(&self, incoming_price: i64) -> bool {
        match self.side {
            // Resting sell: the buyer must pay at least the ask.
            OfferSide::Sell => self.price <= incoming_price,
            // Resting buy: the seller must ask at most the bid.
            OfferSide::Buy => self.price >= incoming_price,
        }
    }

    /// Mark the offer inactive. Returns `false` if it already was.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Offer {
    /// An active offer in channel 1 with a fresh reference and sequence.
    ///
    /// # Panics
    /// Panics if `price` is outside the tradable range.
    pub fn dummy(user_id: UserId, side: OfferSide, price: i64) -> Self {
        Self::dummy_in(ChannelId(1), user_id, side, price)
    }

    /// Like [`Offer::dummy`] but in a chosen channel.
    ///
    /// # Panics
    /// Panics if `price` is outside the tradable range.
    pub fn dummy_in(channel_id: ChannelId, user_id: UserId, side: OfferSide, price: i64) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self::new(OfferRef(n), user_id, channel_id, side, price, Utc::now(), n)
            .expect("dummy offer price must be valid")
    }
}
