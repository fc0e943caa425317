//! # paddock-settlement
//!
//! **Settlement plane**: balances, penalties, and the transaction ledger.
//!
//! ## Architecture
//!
//! A match coming out of a channel book is settled in order:
//! 1. The [`SettlementGuard`] rejects offers that already settled
//! 2. The [`AccountLedger`] applies the accept penalty and the transfer
//! 3. The [`TransactionLog`] appends the transaction under the next id
//!
//! [`MoneyConservation`] checks live balances against accounts opened and
//! fines collected. [`evaluate_round_penalties`] is the after-the-fact
//! batch job over a recorded ledger.

pub mod account_ledger;
pub mod conservation;
pub mod guard;
pub mod round_penalty;
pub mod transaction_log;

pub use account_ledger::{AccountLedger, Penalty, SettlementEffect, SettlementRequest};
pub use conservation::MoneyConservation;
pub use guard::SettlementGuard;
pub use round_penalty::{RoundPenalty, evaluate_round_penalties};
pub use transaction_log::{JsonFileStore, LedgerStore, MemoryStore, TransactionLog};
