//! Pure best-match selection.
//!
//! ```text
//! find_best_match(resting offers, incoming offer, policy) -> index of the winner
//! ```
//!
//! ## Priority
//!
//! - Incoming **buy** at `p`: candidates are active sells priced `<= p`; the
//!   lowest ask wins.
//! - Incoming **sell** at `p`: candidates are active buys priced `>= p`; the
//!   highest bid wins.
//! - Equal prices: earliest `created_at`, then lowest arrival sequence.
//!
//! ## Self-Matching
//!
//! Under [`SelfMatchPolicy::Skip`] the incoming user's own offers are not
//! candidates; the next best offer from someone else is chosen instead.

use std::cmp::Ordering;

use paddock_types::{Offer, OfferSide, SelfMatchPolicy};

/// Index of the resting offer `incoming` should trade against, if any.
#[must_use]
pub fn find_best_match(resting: &[Offer], incoming: &Offer, policy: SelfMatchPolicy) -> Option<usize> {
    let wanted = incoming.side().opposite();
    resting
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_active() && o.side() == wanted)
        .filter(|(_, o)| o.is_matchable_at(incoming.price()))
        .filter(|(_, o)| policy == SelfMatchPolicy::Allow || o.user_id() != incoming.user_id())
        .min_by(|(_, a), (_, b)| priority(incoming.side(), a, b))
        .map(|(idx, _)| idx)
}

/// Ordering of two resting candidates: `Less` means `a` trades first.
fn priority(incoming: OfferSide, a: &Offer, b: &Offer) -> Ordering {
    let by_price = match incoming {
        OfferSide::Buy => a.price().cmp(&b.price()),
        OfferSide::Sell => b.price().cmp(&a.price()),
    };
    by_price.then_with(|| a.time_priority().cmp(&b.time_priority()))
}
