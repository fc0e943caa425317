//! Retrospective per-round penalty evaluation.
//!
//! Runs over a recorded ledger after the fact. Each transaction is assigned
//! to the first round whose end is at or after its timestamp; transactions
//! past the last round end are ignored. Within a round, every transaction
//! counts as an acceptance by its **buyer**, and buyers with more than
//! [`ROUND_ACCEPT_QUOTA`](constants::ROUND_ACCEPT_QUOTA) acceptances are
//! reported.
//!
//! The live engine instead counts the party whose offer triggered the match,
//! which may be the seller. The two counts can disagree.

use std::collections::BTreeMap;

use paddock_types::{RoundId, RoundSchedule, Transaction, UserId, constants};
use serde::{Deserialize, Serialize};

/// One user over quota in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPenalty {
    pub round: RoundId,
    pub user_id: UserId,
    /// Buys recorded for the user in that round.
    pub count: u32,
}

impl std::fmt::Display for RoundPenalty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {} acceptances", self.round, self.user_id, self.count)
    }
}

/// Evaluate round penalties over `transactions`, sorted by round then user.
#[must_use]
pub fn evaluate_round_penalties(
    transactions: &[Transaction],
    schedule: &RoundSchedule,
) -> Vec<RoundPenalty> {
    let mut counts: BTreeMap<(RoundId, UserId), u32> = BTreeMap::new();
    let mut unassigned = 0_usize;
    for tx in transactions {
        match schedule.round_for(tx.timestamp) {
            Some(round) => *counts.entry((round, tx.buyer_id)).or_insert(0) += 1,
            None => unassigned += 1,
        }
    }
    if unassigned > 0 {
        tracing::debug!(unassigned, "transactions after the last round end ignored");
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > constants::ROUND_ACCEPT_QUOTA)
        .map(|((round, user_id), count)| RoundPenalty {
            round,
            user_id,
            count,
        })
        .collect()
}
