//! Ledger fingerprinting.
//!
//! Two penalty runs can only be compared if they read the same ledger. The
//! digest is a SHA-256 over every transaction field in ledger order, so any
//! edited, dropped or reordered entry changes it.

use paddock_types::Transaction;
use sha2::{Digest, Sha256};

/// Compute the digest of a ledger.
#[must_use]
pub fn ledger_digest(transactions: &[Transaction]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"paddock:ledger:v1:");
    hasher.update((transactions.len() as u64).to_le_bytes());

    for tx in transactions {
        hasher.update(tx.transaction_id.0.to_le_bytes());
        hasher.update(tx.buyer_id.0.to_le_bytes());
        hasher.update(tx.seller_id.0.to_le_bytes());
        hasher.update(tx.channel_id.0.to_le_bytes());
        hasher.update(tx.amount.to_le_bytes());
        // Nanosecond precision survives the JSON round trip (RFC 3339).
        hasher.update(tx.timestamp.timestamp().to_le_bytes());
        hasher.update(tx.timestamp.timestamp_subsec_nanos().to_le_bytes());
    }

    hasher.finalize().into()
}

/// Lowercase hex form of [`ledger_digest`], for logs and CLI output.
#[must_use]
pub fn ledger_digest_hex(transactions: &[Transaction]) -> String {
    hex::encode(ledger_digest(transactions))
}

/// Recompute the digest and compare with `expected`.
#[must_use]
pub fn verify_ledger_digest(transactions: &[Transaction], expected: &[u8; 32]) -> bool {
    ledger_digest(transactions) == *expected
}
