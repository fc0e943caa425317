//! The append-only transaction ledger.
//!
//! [`TransactionLog`] issues gapless ids and keeps the in-memory copy of the
//! ledger in step with a [`LedgerStore`]. An append is durable in two steps:
//!
//! 1. the full ledger is written (this is the commit point)
//! 2. the last-issued counter is written
//!
//! If step 1 fails the transaction is dropped from memory and the counter is
//! not advanced, so the next settlement reuses the id. If step 2 fails the
//! transaction stands; the counter is repaired from the ledger on the next
//! open.
//!
//! The ledger is the source of truth for ids: on open the counter is reset to
//! the highest recorded id, whether it lagged or ran ahead.
//!
//! [`JsonFileStore`] rewrites the whole file on every append, so a session of
//! `n` settlements costs O(n²) bytes written. The ledger stays small enough
//! for that to be acceptable.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use paddock_types::{
    ConfigStore, PaddockError, Result, Transaction, TransactionId, write_json_atomic,
};
use serde::Serialize;

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

/// Durable backing for the ledger and its id counter.
pub trait LedgerStore: Send {
    /// Every recorded transaction, in append order.
    fn load_transactions(&mut self) -> Result<Vec<Transaction>>;

    /// Replace the durable ledger with `transactions`.
    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()>;

    /// The last transaction id issued (0 before the first).
    fn load_counter(&mut self) -> Result<u64>;

    fn write_counter(&mut self, last_issued: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LedgerFile<'a> {
    transactions: &'a [Transaction],
}

/// Ledger in a JSON file, counter in the shared market configuration.
pub struct JsonFileStore {
    ledger_path: PathBuf,
    config: Arc<ConfigStore>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(ledger_path: impl Into<PathBuf>, config: Arc<ConfigStore>) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            config,
        }
    }

    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Read a ledger file without opening a store.
    ///
    /// Accepts `{"transactions": [...]}` or a bare array. A missing, empty or
    /// unparseable file reads as an empty ledger; entries that do not decode
    /// are skipped with a warning. The file is never modified.
    pub fn read_ledger(path: &Path) -> Result<Vec<Transaction>> {
        match Self::parse_ledger(path)? {
            LedgerRead::Entries(transactions) => Ok(transactions),
            LedgerRead::Unreadable(reason) => {
                tracing::warn!(path = %path.display(), %reason, "ledger unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn parse_ledger(path: &Path) -> Result<LedgerRead> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LedgerRead::Entries(Vec::new()));
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(LedgerRead::Entries(Vec::new()));
        }

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => return Ok(LedgerRead::Unreadable(e.to_string())),
        };
        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            serde_json::Value::Object(mut map) => match map.remove("transactions") {
                Some(serde_json::Value::Array(entries)) => entries,
                _ => {
                    return Ok(LedgerRead::Unreadable(
                        "object has no transactions array".into(),
                    ));
                }
            },
            _ => {
                return Ok(LedgerRead::Unreadable(
                    "neither an object nor an array".into(),
                ));
            }
        };

        let mut transactions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Transaction>(entry) {
                Ok(tx) => transactions.push(tx),
                Err(e) => tracing::warn!(index, error = %e, "skipping malformed ledger entry"),
            }
        }
        Ok(LedgerRead::Entries(transactions))
    }

    /// Move an unreadable ledger file out of the way so the next append
    /// cannot overwrite it.
    fn move_aside(&self, reason: &str) -> Result<PathBuf> {
        let mut name = self.ledger_path.as_os_str().to_owned();
        name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.6fZ")));
        let aside = PathBuf::from(name);
        fs::rename(&self.ledger_path, &aside)?;
        tracing::warn!(
            path = %self.ledger_path.display(),
            moved_to = %aside.display(),
            %reason,
            "ledger unreadable, moved aside and starting empty"
        );
        Ok(aside)
    }
}

enum LedgerRead {
    Entries(Vec<Transaction>),
    Unreadable(String),
}

impl LedgerStore for JsonFileStore {
    fn load_transactions(&mut self) -> Result<Vec<Transaction>> {
        match Self::parse_ledger(&self.ledger_path)? {
            LedgerRead::Entries(transactions) => Ok(transactions),
            LedgerRead::Unreadable(reason) => {
                self.move_aside(&reason)?;
                Ok(Vec::new())
            }
        }
    }

    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        write_json_atomic(&self.ledger_path, &LedgerFile { transactions })
    }

    fn load_counter(&mut self) -> Result<u64> {
        Ok(self.config.read(|c| c.trade_counter))
    }

    fn write_counter(&mut self, last_issued: u64) -> Result<()> {
        self.config.update(|c| c.trade_counter = last_issued)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A store that keeps everything in memory. Writes can be made to fail
/// through [`MemoryStore::failure_switch`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Vec<Transaction>,
    counter: u64,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a ledger and counter.
    #[must_use]
    pub fn with_ledger(transactions: Vec<Transaction>, counter: u64) -> Self {
        Self {
            transactions,
            counter,
            fail_writes: Arc::default(),
        }
    }

    /// Setting the returned flag makes every later write fail.
    #[must_use]
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_writes)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PaddockError::Persistence("memory store is read-only".into()));
        }
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn load_transactions(&mut self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.clone())
    }

    fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        self.check_writable()?;
        self.transactions = transactions.to_vec();
        Ok(())
    }

    fn load_counter(&mut self) -> Result<u64> {
        Ok(self.counter)
    }

    fn write_counter(&mut self, last_issued: u64) -> Result<()> {
        self.check_writable()?;
        self.counter = last_issued;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TransactionLog
// ---------------------------------------------------------------------------

/// In-memory ledger plus id issuance over a [`LedgerStore`].
pub struct TransactionLog {
    store: Box<dyn LedgerStore>,
    transactions: Vec<Transaction>,
    last_issued: TransactionId,
}

impl TransactionLog {
    /// Load the ledger and counter, resetting the counter to the highest
    /// recorded id if the two disagree.
    pub fn open(mut store: Box<dyn LedgerStore>) -> Result<Self> {
        let transactions = store.load_transactions()?;
        let counter = store.load_counter()?;
        let highest = transactions
            .iter()
            .map(|tx| tx.transaction_id.0)
            .max()
            .unwrap_or(0);

        if counter != highest {
            tracing::warn!(counter, highest, "trade counter disagrees with ledger, repairing");
            if let Err(e) = store.write_counter(highest) {
                tracing::warn!(error = %e, "could not persist repaired trade counter");
            }
        }

        Ok(Self {
            store,
            transactions,
            last_issued: TransactionId(highest),
        })
    }

    /// The id the next appended transaction must carry.
    #[must_use]
    pub fn next_id(&self) -> TransactionId {
        self.last_issued.next()
    }

    #[must_use]
    pub fn last_issued(&self) -> TransactionId {
        self.last_issued
    }

    /// Durably append a transaction.
    ///
    /// # Errors
    /// - [`PaddockError::Internal`] if `tx` does not carry [`Self::next_id`]
    /// - the store's error if the ledger write fails; nothing is recorded
    ///   and the id will be issued again
    pub fn append(&mut self, tx: Transaction) -> Result<()> {
        let expected = self.next_id();
        if tx.transaction_id != expected {
            return Err(PaddockError::Internal(format!(
                "transaction {} appended, expected {expected}",
                tx.transaction_id
            )));
        }

        self.transactions.push(tx);
        if let Err(e) = self.store.write_transactions(&self.transactions) {
            self.transactions.pop();
            return Err(e);
        }
        self.last_issued = expected;

        if let Err(e) = self.store.write_counter(expected.0) {
            tracing::warn!(
                transaction = %expected,
                error = %e,
                "transaction recorded but trade counter not persisted"
            );
        }
        Ok(())
    }

    /// Write the ledger and counter again.
    pub fn flush(&mut self) -> Result<()> {
        self.store.write_transactions(&self.transactions)?;
        self.store.write_counter(self.last_issued.0)
    }

    /// Recorded transactions in append order.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl std::fmt::Debug for TransactionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLog")
            .field("len", &self.transactions.len())
            .field("last_issued", &self.last_issued)
            .finish_non_exhaustive()
    }
}
