//! Per-user transaction history built from the ledger.

use chrono::{DateTime, Utc};
use paddock_types::{OfferSide, RoundId, RoundSchedule, Transaction, TransactionId, UserId};
use serde::{Deserialize, Serialize};

/// One transaction seen from one user's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub transaction_id: TransactionId,
    pub timestamp: DateTime<Utc>,
    /// `Buy` if the user bought, `Sell` if they sold.
    pub role: OfferSide,
    pub counterparty: UserId,
    pub amount: i64,
    /// `None` for transactions after the last round end.
    pub round: Option<RoundId>,
}

impl StatementLine {
    /// Round label, or `"after last round"`.
    #[must_use]
    pub fn round_label(&self) -> String {
        self.round
            .map_or_else(|| "after last round".to_string(), |r| r.to_string())
    }
}

/// A user's transactions, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub user_id: UserId,
    pub filter: Option<OfferSide>,
    pub lines: Vec<StatementLine>,
}

impl Statement {
    /// Collect the user's transactions, optionally only buys or only sells.
    #[must_use]
    pub fn for_user(
        ledger: &[Transaction],
        user: UserId,
        filter: Option<OfferSide>,
        schedule: &RoundSchedule,
    ) -> Self {
        let mut lines: Vec<StatementLine> = ledger
            .iter()
            .filter_map(|tx| {
                let role = tx.role_of(user)?;
                if filter.is_some_and(|f| f != role) {
                    return None;
                }
                Some(StatementLine {
                    transaction_id: tx.transaction_id,
                    timestamp: tx.timestamp,
                    role,
                    counterparty: tx.counterparty(user)?,
                    amount: tx.amount,
                    round: schedule.round_for(tx.timestamp),
                })
            })
            .collect();
        lines.sort_by_key(|l| (l.timestamp, l.transaction_id));

        Self {
            user_id: user,
            filter,
            lines,
        }
    }

    /// Amount spent buying minus amount received selling.
    #[must_use]
    pub fn net_position(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| match l.role {
                OfferSide::Buy => l.amount,
                OfferSide::Sell => -l.amount,
            })
            .sum()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
