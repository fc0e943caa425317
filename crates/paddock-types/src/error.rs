//! Error types for the Paddock engine.
//!
//! All errors use the `PD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Offer errors
//! - 2xx: Channel errors
//! - 6xx: Settlement errors
//! - 7xx: Persistence errors
//! - 9xx: General / internal errors
//!
//! Ordinary rejections (bad price, closed channel, foreign cancel) are not
//! errors; they travel as [`crate::SubmitOutcome`] values.

use thiserror::Error;

use crate::{OfferRef, Transaction};

/// Central error enum for all Paddock operations.
#[derive(Debug, Error)]
pub enum PaddockError {
    // =================================================================
    // Offer Errors (1xx)
    // =================================================================
    /// The offer price lies outside the tradable range.
    #[error("PD_ERR_100: Invalid price {price}: must be between {min} and {max}")]
    InvalidPrice { price: i64, min: i64, max: i64 },

    /// The side token is neither buy nor sell.
    #[error("PD_ERR_101: Invalid side: {0:?}")]
    InvalidSide(String),

    /// An offer with this reference is already on the book.
    #[error("PD_ERR_102: Offer already exists: {0}")]
    DuplicateOffer(OfferRef),

    // =================================================================
    // Channel Errors (2xx)
    // =================================================================
    /// The horse label is not one of the configured labels.
    #[error("PD_ERR_200: Invalid horse label: {0:?}")]
    InvalidHorseLabel(char),

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// An offer took part in a settlement already (at-most-once guard).
    #[error("PD_ERR_600: Offer already settled: {0}")]
    OfferAlreadySettled(OfferRef),

    /// Money conservation invariant violated.
    #[error("PD_ERR_601: Money conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Persistence Errors (7xx)
    // =================================================================
    /// The durable store could not be written.
    #[error("PD_ERR_700: Persistence failure: {0}")]
    Persistence(String),

    /// Balances were updated in memory but the transaction never reached
    /// the durable ledger. Live balances and the ledger now disagree.
    #[error("PD_ERR_701: Settlement applied in memory but not recorded ({transaction}): {reason}")]
    SettlementNotRecorded {
        transaction: Box<Transaction>,
        reason: String,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PD_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PD_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad round table, etc.).
    #[error("PD_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("PD_ERR_903: I/O error: {0}")]
    Io(String),
}

impl PaddockError {
    /// Whether this error means live balances and the ledger may disagree.
    #[must_use]
    pub fn is_consistency_hazard(&self) -> bool {
        matches!(self, Self::SettlementNotRecorded { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PaddockError>;

impl From<std::io::Error> for PaddockError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PaddockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
