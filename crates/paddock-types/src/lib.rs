//! # paddock-types
//!
//! Shared types, errors, and configuration for the **Paddock** offer
//! matching engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`UserId`], [`ChannelId`], [`OfferRef`], [`TransactionId`], [`RoundId`]
//! - **Offer model**: [`Offer`], [`OfferSide`]
//! - **Ledger model**: [`Transaction`]
//! - **Account model**: [`UserAccount`]
//! - **Rounds**: [`RoundSchedule`]
//! - **Outcomes**: [`SubmitOutcome`], [`RejectReason`], [`OfferSubmission`]
//! - **Configuration**: [`MarketConfig`], [`ConfigStore`], [`SelfMatchPolicy`]
//! - **Errors**: [`PaddockError`] with `PD_ERR_` prefix codes
//! - **Constants**: price bounds, penalty limits, account defaults

pub mod account;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod offer;
pub mod outcome;
pub mod round;
pub mod transaction;

pub use account::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use offer::*;
pub use outcome::*;
pub use round::*;
pub use transaction::*;

// Constants are accessed via `paddock_types::constants::FOO`.
