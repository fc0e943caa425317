//! The order book for a single channel.
//!
//! Offers are kept in insertion order and never removed: matching or
//! cancelling only flips `active`, so the book doubles as an audit trail for
//! the lifetime of the process. An auxiliary `HashMap<OfferRef, usize>`
//! gives O(1) lookup for cancellation.
//!
//! Prices live in a narrow integer band, so best-match selection is a linear
//! scan over the active offers (see [`crate::matcher`]).

use std::collections::HashMap;

use paddock_types::{ChannelId, Offer, OfferRef, OfferSide, PaddockError, Result, SelfMatchPolicy, UserId};

use crate::matcher::find_best_match;

/// What happened to an offer handed to [`ChannelBook::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// No crossing offer; the offer now rests on the book.
    Rested,
    /// The offer crossed a resting offer. The resting offer is now inactive
    /// and the incoming offer was not added to the book.
    Matched { resting: Offer, incoming: Offer },
}

impl MatchResult {
    /// Price the match settles at (the resting offer's price).
    #[must_use]
    pub fn settlement_price(&self) -> Option<i64> {
        match self {
            Self::Rested => None,
            Self::Matched { resting, .. } => Some(resting.price()),
        }
    }

    /// `(buyer, seller)` of a match.
    #[must_use]
    pub fn parties(&self) -> Option<(UserId, UserId)> {
        match self {
            Self::Rested => None,
            Self::Matched { resting, incoming } => Some(match incoming.side() {
                OfferSide::Buy => (incoming.user_id(), resting.user_id()),
                OfferSide::Sell => (resting.user_id(), incoming.user_id()),
            }),
        }
    }
}

/// The order book for a single channel.
#[derive(Debug)]
pub struct ChannelBook {
    /// The channel this book serves.
    pub channel: ChannelId,
    /// Every offer ever rested here, in arrival order.
    offers: Vec<Offer>,
    /// `OfferRef -> position in offers`.
    index: HashMap<OfferRef, usize>,
    self_match: SelfMatchPolicy,
}

impl ChannelBook {
    /// Create a new empty book for the given channel.
    #[must_use]
    pub fn new(channel: ChannelId, self_match: SelfMatchPolicy) -> Self {
        Self {
            channel,
            offers: Vec::new(),
            index: HashMap::new(),
            self_match,
        }
    }

    // =================================================================
    // Matching
    // =================================================================

    /// Match `offer` against the book, or rest it if nothing crosses.
    pub fn submit(&mut self, offer: Offer) -> Result<MatchResult> {
        if offer.channel_id() != self.channel {
            return Err(PaddockError::Internal(format!(
                "{} routed to book for {}",
                offer.id(),
                self.channel
            )));
        }
        if self.index.contains_key(&offer.id()) {
            return Err(PaddockError::DuplicateOffer(offer.id()));
        }

        match find_best_match(&self.offers, &offer, self.self_match) {
            Some(pos) => {
                let resting = &mut self.offers[pos];
                resting.deactivate();
                tracing::debug!(
                    channel = %self.channel,
                    resting = %resting.id(),
                    incoming = %offer.id(),
                    price = resting.price(),
                    "offer matched"
                );
                Ok(MatchResult::Matched {
                    resting: resting.clone(),
                    incoming: offer,
                })
            }
            None => {
                self.index.insert(offer.id(), self.offers.len());
                self.offers.push(offer);
                Ok(MatchResult::Rested)
            }
        }
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel an active offer owned by `requester`.
    ///
    /// Returns `false` (and changes nothing) for unknown offers, offers owned
    /// by someone else, and offers that already matched or were cancelled.
    pub fn cancel(&mut self, offer_ref: OfferRef, requester: UserId) -> bool {
        let Some(&pos) = self.index.get(&offer_ref) else {
            return false;
        };
        let offer = &mut self.offers[pos];
        if offer.user_id() != requester {
            return false;
        }
        offer.deactivate()
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Look up an offer (active or not) by reference.
    #[must_use]
    pub fn get(&self, offer_ref: OfferRef) -> Option<&Offer> {
        self.index.get(&offer_ref).map(|&pos| &self.offers[pos])
    }

    /// Active offers in arrival order.
    pub fn active_offers(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter().filter(|o| o.is_active())
    }

    /// Every offer that ever rested here, in arrival order.
    #[must_use]
    pub fn history(&self) -> &[Offer] {
        &self.offers
    }

    /// Best (highest) active bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<i64> {
        self.active_offers()
            .filter(|o| o.side() == OfferSide::Buy)
            .map(Offer::price)
            .max()
    }

    /// Best (lowest) active ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<i64> {
        self.active_offers()
            .filter(|o| o.side() == OfferSide::Sell)
            .map(Offer::price)
            .min()
    }

    /// Number of active offers.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_offers().count()
    }

    /// Returns `true` if no offer is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_offers().next().is_none()
    }

    #[must_use]
    pub fn self_match_policy(&self) -> SelfMatchPolicy {
        self.self_match
    }
}

#[cfg(test)]
mod tests {
    use paddock_types::*;

    use super::*;

    fn book() -> ChannelBook {
        ChannelBook::new(ChannelId(1), SelfMatchPolicy::Skip)
    }

    #[test]
    fn sell_then_crossing_buy_settles_at_resting_price() {
        let mut book = book();
        let ask = Offer::dummy(UserId(1), OfferSide::Sell, 20);
        let ask_id = ask.id();
        assert_eq!(book.submit(ask).unwrap(), MatchResult::Rested);

        let result = book.submit(Offer::dummy(UserId(2), OfferSide::Buy, 25)).unwrap();
        assert_eq!(result.settlement_price(), Some(20));
        assert_eq!(result.parties(), Some((UserId(2), UserId(1))));
        match result {
            MatchResult::Matched { resting, incoming } => {
                assert_eq!(resting.id(), ask_id);
                assert!(!resting.is_active());
                assert_eq!(incoming.price(), 25);
            }
            MatchResult::Rested => panic!("expected a match"),
        }
        assert!(book.is_empty());
        assert!(!book.get(ask_id).unwrap().is_active());
    }

    #[test]
    fn higher_bid_wins_for_incoming_sell() {
        let mut book = book();
        let a = Offer::dummy(UserId(1), OfferSide::Buy, 10);
        let b = Offer::dummy(UserId(2), OfferSide::Buy, 12);
        let (a_id, b_id) = (a.id(), b.id());
        book.submit(a).unwrap();
        book.submit(b).unwrap();

        let result = book.submit(Offer::dummy(UserId(3), OfferSide::Sell, 10)).unwrap();
        assert_eq!(result.settlement_price(), Some(12));
        assert_eq!(result.parties(), Some((UserId(2), UserId(3))));
        assert!(book.get(a_id).unwrap().is_active());
        assert!(!book.get(b_id).unwrap().is_active());
    }

    #[test]
    fn incoming_matched_offer_is_not_added() {
        let mut book = book();
        book.submit(Offer::dummy(UserId(1), OfferSide::Sell, 20)).unwrap();
        let buy = Offer::dummy(UserId(2), OfferSide::Buy, 30);
        let buy_id = buy.id();
        book.submit(buy).unwrap();
        assert!(book.get(buy_id).is_none());
        assert_eq!(book.history().len(), 1);
    }

    #[test]
    fn non_crossing_offers_rest() {
        let mut book = book();
        book.submit(Offer::dummy(UserId(1), OfferSide::Buy, 10)).unwrap();
        book.submit(Offer::dummy(UserId(2), OfferSide::Sell, 11)).unwrap();
        assert_eq!(book.active_count(), 2);
        assert_eq!(book.best_bid(), Some(10));
        assert_eq!(book.best_ask(), Some(11));
    }

    #[test]
    fn duplicate_offer_rejected() {
        let mut book = book();
        let offer = Offer::dummy(UserId(1), OfferSide::Buy, 10);
        book.submit(offer.clone()).unwrap();
        assert!(matches!(
            book.submit(offer),
            Err(PaddockError::DuplicateOffer(_))
        ));
    }

    #[test]
    fn wrong_channel_rejected() {
        let mut book = book();
        let offer = Offer::dummy_in(ChannelId(2), UserId(1), OfferSide::Buy, 10);
        assert!(matches!(book.submit(offer), Err(PaddockError::Internal(_))));
    }

    #[test]
    fn cancel_own_active_offer() {
        let mut book = book();
        let offer = Offer::dummy(UserId(1), OfferSide::Buy, 10);
        let id = offer.id();
        book.submit(offer).unwrap();
        assert!(book.cancel(id, UserId(1)));
        assert!(book.is_empty());
        assert!(book.get(id).is_some(), "cancelled offers stay for audit");
    }

    #[test]
    fn cancel_noops() {
        let mut book = book();
        let offer = Offer::dummy(UserId(1), OfferSide::Sell, 30);
        let id = offer.id();
        book.submit(offer).unwrap();

        assert!(!book.cancel(OfferRef(u64::MAX), UserId(1)), "unknown offer");
        assert!(!book.cancel(id, UserId(2)), "someone else's offer");
        assert!(book.get(id).unwrap().is_active());

        assert!(book.cancel(id, UserId(1)));
        assert!(!book.cancel(id, UserId(1)), "already cancelled");
    }

    #[test]
    fn cancel_after_match_is_noop() {
        let mut book = book();
        let ask = Offer::dummy(UserId(1), OfferSide::Sell, 30);
        let id = ask.id();
        book.submit(ask).unwrap();
        book.submit(Offer::dummy(UserId(2), OfferSide::Buy, 30)).unwrap();
        assert!(!book.cancel(id, UserId(1)));
    }

    #[test]
    fn cancelled_offer_cannot_match() {
        let mut book = book();
        let ask = Offer::dummy(UserId(1), OfferSide::Sell, 10);
        let id = ask.id();
        book.submit(ask).unwrap();
        book.cancel(id, UserId(1));
        let result = book.submit(Offer::dummy(UserId(2), OfferSide::Buy, 50)).unwrap();
        assert_eq!(result, MatchResult::Rested);
    }

    #[test]
    fn same_user_may_hold_several_offers() {
        let mut book = book();
        book.submit(Offer::dummy(UserId(1), OfferSide::Buy, 10)).unwrap();
        book.submit(Offer::dummy(UserId(1), OfferSide::Buy, 11)).unwrap();
        assert_eq!(book.active_count(), 2);
    }

    #[test]
    fn self_match_skipped_by_default() {
        let mut book = book();
        book.submit(Offer::dummy(UserId(1), OfferSide::Sell, 10)).unwrap();
        let result = book.submit(Offer::dummy(UserId(1), OfferSide::Buy, 10)).unwrap();
        assert_eq!(result, MatchResult::Rested);
        assert_eq!(book.active_count(), 2);
    }

    #[test]
    fn self_match_allowed_when_configured() {
        let mut book = ChannelBook::new(ChannelId(1), SelfMatchPolicy::Allow);
        book.submit(Offer::dummy(UserId(1), OfferSide::Sell, 10)).unwrap();
        let result = book.submit(Offer::dummy(UserId(1), OfferSide::Buy, 10)).unwrap();
        assert_eq!(result.parties(), Some((UserId(1), UserId(1))));
    }

    #[test]
    fn randomized_buys_always_take_the_cheapest_ask() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut book = book();
        for round in 0..500_u64 {
            let price = rng.gen_range(5..=99);
            if rng.gen_bool(0.5) {
                book.submit(Offer::dummy(UserId(1000 + round), OfferSide::Sell, price))
                    .unwrap();
                continue;
            }
            let best_before = book.best_ask();
            let oldest_at_best = best_before.and_then(|ask| {
                book.active_offers()
                    .filter(|o| o.side() == OfferSide::Sell && o.price() == ask)
                    .min_by_key(|o| o.time_priority())
                    .map(Offer::id)
            });
            let result = book
                .submit(Offer::dummy(UserId(5000 + round), OfferSide::Buy, price))
                .unwrap();
            match result {
                MatchResult::Matched { resting, .. } => {
                    assert_eq!(Some(resting.price()), best_before);
                    assert_eq!(Some(resting.id()), oldest_at_best);
                    assert!(resting.price() <= price);
                }
                MatchResult::Rested => {
                    assert!(best_before.is_none_or(|ask| ask > price));
                }
            }
        }
    }
}
