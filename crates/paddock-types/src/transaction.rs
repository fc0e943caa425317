//! Ledger entries produced by settlement.
//!
//! A [`Transaction`] is the immutable record of one settled match. The JSON
//! shape of this struct is the on-disk ledger format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, OfferSide, TransactionId, UserId};

/// A settled trade between a buyer and a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Global ledger sequence number.
    pub transaction_id: TransactionId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    /// The channel whose book produced the match.
    pub channel_id: ChannelId,
    /// Settlement price (always the resting offer's price).
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// The side the user traded on, if they took part.
    ///
    /// A self-matched transaction reports `Buy`.
    #[must_use]
    pub fn role_of(&self, user: UserId) -> Option<OfferSide> {
        if self.buyer_id == user {
            Some(OfferSide::Buy)
        } else if self.seller_id == user {
            Some(OfferSide::Sell)
        } else {
            None
        }
    }

    /// The other party from the user's point of view.
    #[must_use]
    pub fn counterparty(&self, user: UserId) -> Option<UserId> {
        match self.role_of(user)? {
            OfferSide::Buy => Some(self.seller_id),
            OfferSide::Sell => Some(self.buyer_id),
        }
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transaction {} {}: {} buys from {} for ${}",
            self.transaction_id, self.channel_id, self.buyer_id, self.seller_id, self.amount,
        )
    }
}
