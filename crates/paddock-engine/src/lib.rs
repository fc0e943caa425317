//! # paddock-engine
//!
//! The **Paddock** offer matching and settlement engine.
//!
//! [`MatchingEngine`] is the only entry point the messaging collaborator
//! needs: it receives normalized offer and cancel events and hands back
//! typed outcomes. Everything user-visible (reactions, replies, log lines)
//! is built by the collaborator from those outcomes.
//!
//! - [`ChannelRegistry`]: which channels trade, and which are closed
//! - [`OfferValidator`]: channel state and price band checks
//! - [`Statement`]: per-user history from the ledger
//!
//! ```text
//! OfferSubmitted ─▶ OfferValidator ─▶ ChannelBook ─▶ AccountLedger ─▶ TransactionLog
//!                        │                 │                               │
//!                    Rejected           Queued                          Settled
//! ```

pub mod engine;
pub mod registry;
pub mod statement;
pub mod validator;

pub use engine::{AuditReport, MatchingEngine};
pub use registry::{ChannelRegistry, ChannelState};
pub use statement::{Statement, StatementLine};
pub use validator::OfferValidator;
