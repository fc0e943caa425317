//! Account balances and the acceptance-limit penalty.
//!
//! Settlement is a single infallible `&mut self` call:
//! 1. Count the accept (only when the accepting party did not author the
//!    resting offer)
//! 2. Over [`ACCEPT_LIMIT`](constants::ACCEPT_LIMIT): burn a garnet, or fine
//!    [`FINE_AMOUNT`](constants::FINE_AMOUNT) if none are left
//! 3. Move `price` from buyer to seller
//! 4. Buyer hype +1, seller hype −1 in the trade's channel
//!
//! Accounts are created lazily with the starting allowance the first time a
//! user is touched. Accept counters are scoped to the current round and are
//! never persisted.

use std::collections::HashMap;

use paddock_types::{
    ChannelId, Result, RoundId, Transaction, UserAccount, UserId, constants,
};

use crate::conservation::MoneyConservation;

/// Everything [`AccountLedger::settle`] needs to know about one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementRequest {
    pub buyer: UserId,
    pub seller: UserId,
    pub price: i64,
    pub channel: ChannelId,
    /// The user whose submission triggered the match.
    pub accepting_party: UserId,
    /// The user who posted the resting offer.
    pub resting_author: UserId,
}

/// Penalty applied for an over-limit accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    /// A garnet was consumed instead of a fine.
    GarnetConsumed { remaining: u32 },
    /// Money was debited.
    Fined { amount: i64 },
}

/// What a settlement did beyond the plain transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettlementEffect {
    /// The accepting party's accept count this round, if the match counted.
    pub accept_count: Option<u32>,
    pub penalty: Option<Penalty>,
}

/// Live per-user balances, hype and accept counters.
#[derive(Debug)]
pub struct AccountLedger {
    accounts: HashMap<UserId, UserAccount>,
    accepts: HashMap<(UserId, RoundId), u32>,
    round: RoundId,
    conservation: MoneyConservation,
}

impl AccountLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            accepts: HashMap::new(),
            round: RoundId::FIRST,
            conservation: MoneyConservation::new(),
        }
    }

    // =================================================================
    // Rounds
    // =================================================================

    /// The round accept counts are currently recorded against.
    #[must_use]
    pub fn current_round(&self) -> RoundId {
        self.round
    }

    /// Start counting accepts against `round`. Earlier counts are kept.
    pub fn set_round(&mut self, round: RoundId) {
        if round != self.round {
            tracing::info!(from = %self.round, to = %round, "round changed");
            self.round = round;
        }
    }

    /// Accepts recorded for a user in a round.
    #[must_use]
    pub fn accepts_in(&self, user: UserId, round: RoundId) -> u32 {
        self.accepts.get(&(user, round)).copied().unwrap_or(0)
    }

    // =================================================================
    // Settlement
    // =================================================================

    /// Apply the accept penalty (if any) and the transfer for one match.
    pub fn settle(&mut self, req: &SettlementRequest) -> SettlementEffect {
        let mut effect = SettlementEffect::default();

        if req.accepting_party != req.resting_author {
            let count = self.record_accept(req.accepting_party);
            effect.accept_count = Some(count);
            if count > constants::ACCEPT_LIMIT {
                effect.penalty = Some(self.penalize(req.accepting_party));
            }
        }

        self.transfer(req.buyer, req.seller, req.price, req.channel);
        effect
    }

    /// Rebuild money and hype from a recorded ledger.
    ///
    /// Fines and garnet use never reach the ledger, so they are not
    /// recovered. Accept counters are left alone.
    pub fn replay(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            self.transfer(tx.buyer_id, tx.seller_id, tx.amount, tx.channel_id);
        }
        if !transactions.is_empty() {
            tracing::info!(
                transactions = transactions.len(),
                accounts = self.accounts.len(),
                "accounts rebuilt from ledger"
            );
        }
    }

    fn record_accept(&mut self, user: UserId) -> u32 {
        let count = self.accepts.entry((user, self.round)).or_insert(0);
        *count += 1;
        *count
    }

    fn penalize(&mut self, user: UserId) -> Penalty {
        let account = self.account_entry(user);
        let penalty = if account.garnets > 0 {
            account.garnets -= 1;
            Penalty::GarnetConsumed {
                remaining: account.garnets,
            }
        } else {
            account.money -= constants::FINE_AMOUNT;
            Penalty::Fined {
                amount: constants::FINE_AMOUNT,
            }
        };
        if let Penalty::Fined { amount } = penalty {
            self.conservation.record_fine(amount);
        }
        tracing::info!(user = %user, round = %self.round, ?penalty, "accept limit exceeded");
        penalty
    }

    fn transfer(&mut self, buyer: UserId, seller: UserId, price: i64, channel: ChannelId) {
        let buyer_account = self.account_entry(buyer);
        buyer_account.money -= price;
        *buyer_account.hype.entry(channel).or_insert(0) += 1;

        let seller_account = self.account_entry(seller);
        seller_account.money += price;
        *seller_account.hype.entry(channel).or_insert(0) -= 1;
    }

    fn account_entry(&mut self, user: UserId) -> &mut UserAccount {
        let conservation = &mut self.conservation;
        self.accounts.entry(user).or_insert_with(|| {
            conservation.record_account();
            UserAccount::new()
        })
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Snapshot of a user's account. Unknown users get the starting
    /// allowance without an account being created.
    #[must_use]
    pub fn account(&self, user: UserId) -> UserAccount {
        self.accounts.get(&user).cloned().unwrap_or_default()
    }

    /// Whether the user has been touched by any settlement.
    #[must_use]
    pub fn has_account(&self, user: UserId) -> bool {
        self.accounts.contains_key(&user)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&UserId, &UserAccount)> {
        self.accounts.iter()
    }

    #[must_use]
    pub fn total_fines(&self) -> i64 {
        self.conservation.fines_collected()
    }

    /// Check money and hype conservation across every account.
    pub fn verify_conservation(&self) -> Result<()> {
        self.conservation.verify(self.accounts.values())
    }

    /// Direct access to an account, creating it if needed.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn account_mut(&mut self, user: UserId) -> &mut UserAccount {
        self.account_entry(user)
    }
}

impl Default for AccountLedger {
    fn default() -> Self {
        Self::new()
    }
}
