//! # paddock-matchcore
//!
//! **Channel order books and the matching rule.**
//!
//! Each channel owns one [`ChannelBook`]. Books are independent of each
//! other and of any balance or ledger state:
//!
//! - **Price/time priority**: best resting price first, earliest submission
//!   breaks ties
//! - **Resting price settles**: the incoming offer takes the resting quote
//! - **Single fill**: every offer trades whole, at most once
//! - **Audit trail**: matched and cancelled offers stay in the book, inactive

pub mod digest;
pub mod matcher;
pub mod orderbook;

pub use digest::{ledger_digest, ledger_digest_hex, verify_ledger_digest};
pub use matcher::find_best_match;
pub use orderbook::{ChannelBook, MatchResult};
