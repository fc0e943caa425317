//! The matching engine: channel books, settlement and the ledger wired
//! together behind `submit_offer` / `cancel_offer`.
//!
//! ## Locking
//!
//! ```text
//! books: DashMap<ChannelId, Arc<Mutex<ChannelBook>>>   one lock per channel
//! desk:  Mutex<SettlementDesk>                         one lock for the process
//! ```
//!
//! A submission holds its channel's lock from matching through settlement,
//! so a channel sees one offer at a time. The desk lock covers id issuance,
//! account mutation and the durable append, and is only ever taken while
//! holding at most one channel lock (channel → desk). Different channels
//! contend only on the desk, and only for the duration of a settlement.
//!
//! The arrival sequence is drawn under the channel lock, so a book's order
//! always follows sequence order. Before an offer reaches its book, its
//! reference is claimed on the desk's guard; a reference resting in one
//! channel cannot be submitted in another until it settles or is cancelled.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use paddock_matchcore::{ChannelBook, MatchResult, ledger_digest_hex};
use paddock_settlement::{
    AccountLedger, JsonFileStore, LedgerStore, RoundPenalty, SettlementGuard, SettlementRequest,
    TransactionLog, evaluate_round_penalties,
};
use paddock_types::{
    ChannelId, ConfigStore, MarketConfig, Offer, OfferRef, OfferSide, OfferSubmission,
    PaddockError, Result, RoundId, RoundSchedule, SelfMatchPolicy, SubmitOutcome, Transaction,
    UserAccount, UserId, constants,
};
use parking_lot::Mutex;
use serde::Serialize;

use crate::registry::ChannelRegistry;
use crate::statement::Statement;
use crate::validator::OfferValidator;

/// Process-wide settlement state, always locked as a unit.
struct SettlementDesk {
    accounts: AccountLedger,
    log: TransactionLog,
    guard: SettlementGuard,
}

/// Result of [`MatchingEngine::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub transactions: usize,
    pub accounts: usize,
    pub total_money: i64,
    pub fines_collected: i64,
    pub ledger_digest: String,
}

/// The offer matching and settlement engine.
pub struct MatchingEngine {
    config: Arc<ConfigStore>,
    registry: ChannelRegistry,
    validator: OfferValidator,
    books: DashMap<ChannelId, Arc<Mutex<ChannelBook>>>,
    desk: Mutex<SettlementDesk>,
    /// Arrival counter handed to every offer.
    sequence: AtomicU64,
    schedule: RoundSchedule,
    self_match: SelfMatchPolicy,
}

impl MatchingEngine {
    /// Open the engine over a data directory holding `config.json` and
    /// `transactions.json`. Missing files are created on first write.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        let config = Arc::new(ConfigStore::open(dir.join(constants::CONFIG_FILE_NAME))?);
        let store = JsonFileStore::new(dir.join(constants::LEDGER_FILE_NAME), Arc::clone(&config));
        Self::with_store(config, Box::new(store))
    }

    /// Build the engine over an explicit configuration and ledger store.
    ///
    /// Balances and hype are rebuilt from the recorded ledger.
    pub fn with_store(config: Arc<ConfigStore>, store: Box<dyn LedgerStore>) -> Result<Self> {
        let log = TransactionLog::open(store)?;
        let mut accounts = AccountLedger::new();
        accounts.replay(log.transactions());

        let schedule = config.read(MarketConfig::schedule)?;
        let self_match = config.read(|c| c.self_match);
        let registry = ChannelRegistry::new(Arc::clone(&config));

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            transactions = log.len(),
            next_transaction = %log.next_id(),
            ?self_match,
            "matching engine started"
        );

        Ok(Self {
            validator: OfferValidator::new(registry.clone()),
            registry,
            config,
            books: DashMap::new(),
            desk: Mutex::new(SettlementDesk {
                accounts,
                log,
                guard: SettlementGuard::new(),
            }),
            sequence: AtomicU64::new(1),
            schedule,
            self_match,
        })
    }

    // =================================================================
    // Trading
    // =================================================================

    /// Validate, match and (on a match) settle and record one offer.
    ///
    /// # Errors
    /// - [`PaddockError::DuplicateOffer`] if the offer reference rests on
    ///   any channel's book, or was used before in this channel
    /// - [`PaddockError::OfferAlreadySettled`] if the reference settled before
    /// - [`PaddockError::SettlementNotRecorded`] if balances changed but the
    ///   ledger write failed
    pub fn submit_offer(&self, submission: OfferSubmission) -> Result<SubmitOutcome> {
        if let Err(reason) = self.validator.validate(&submission) {
            tracing::warn!(
                channel = %submission.channel_id,
                user = %submission.user_id,
                offer = %submission.offer_ref,
                %reason,
                "offer rejected"
            );
            return Ok(SubmitOutcome::Rejected(reason));
        }

        let book = self.book(submission.channel_id);
        let mut book = book.lock();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let offer = Offer::from_submission(&submission, sequence)?;
        self.desk.lock().guard.claim(offer.id())?;

        match book.submit(offer) {
            Ok(MatchResult::Rested) => {
                tracing::debug!(
                    channel = %submission.channel_id,
                    user = %submission.user_id,
                    offer = %submission.offer_ref,
                    side = %submission.side,
                    price = submission.price,
                    "offer queued"
                );
                Ok(SubmitOutcome::Queued)
            }
            Ok(matched) => {
                let mut desk = self.desk.lock();
                Self::settle(&mut desk, &matched, &submission)
            }
            Err(e) => {
                self.desk.lock().guard.release(submission.offer_ref);
                Err(e)
            }
        }
    }

    fn settle(
        desk: &mut SettlementDesk,
        matched: &MatchResult,
        submission: &OfferSubmission,
    ) -> Result<SubmitOutcome> {
        let (MatchResult::Matched { resting, incoming }, Some((buyer, seller)), Some(price)) =
            (matched, matched.parties(), matched.settlement_price())
        else {
            return Err(PaddockError::Internal(format!(
                "{} reached settlement without a match",
                submission.offer_ref
            )));
        };
        desk.guard.mark_settled(resting.id(), incoming.id())?;

        let effect = desk.accounts.settle(&SettlementRequest {
            buyer,
            seller,
            price,
            channel: submission.channel_id,
            accepting_party: incoming.user_id(),
            resting_author: resting.user_id(),
        });

        let tx = Transaction {
            transaction_id: desk.log.next_id(),
            buyer_id: buyer,
            seller_id: seller,
            channel_id: submission.channel_id,
            amount: price,
            timestamp: submission.submitted_at,
        };

        if let Err(e) = desk.log.append(tx.clone()) {
            tracing::error!(
                transaction = %tx.transaction_id,
                channel = %tx.channel_id,
                buyer = %buyer,
                seller = %seller,
                amount = price,
                error = %e,
                "settlement applied but not recorded"
            );
            return Err(PaddockError::SettlementNotRecorded {
                transaction: Box::new(tx),
                reason: e.to_string(),
            });
        }

        tracing::info!(
            transaction = %tx.transaction_id,
            channel = %tx.channel_id,
            buyer = %buyer,
            seller = %seller,
            amount = price,
            accept_count = ?effect.accept_count,
            penalty = ?effect.penalty,
            "offer settled"
        );
        Ok(SubmitOutcome::Settled(tx))
    }

    /// Cancel a resting offer. `false` if the offer is unknown, not owned by
    /// `user`, or no longer active.
    pub fn cancel_offer(&self, channel: ChannelId, offer_ref: OfferRef, user: UserId) -> bool {
        let Some(book) = self.books.get(&channel).map(|b| Arc::clone(b.value())) else {
            return false;
        };
        let mut book = book.lock();
        let cancelled = book.cancel(offer_ref, user);
        if cancelled {
            self.desk.lock().guard.release(offer_ref);
        }
        tracing::debug!(channel = %channel, offer = %offer_ref, user = %user, cancelled, "cancel requested");
        cancelled
    }

    fn book(&self, channel: ChannelId) -> Arc<Mutex<ChannelBook>> {
        let entry = self
            .books
            .entry(channel)
            .or_insert_with(|| Arc::new(Mutex::new(ChannelBook::new(channel, self.self_match))));
        Arc::clone(entry.value())
    }

    // =================================================================
    // Rounds
    // =================================================================

    /// Count live accepts against `round` from now on.
    pub fn begin_round(&self, round: RoundId) {
        self.desk.lock().accounts.set_round(round);
    }

    #[must_use]
    pub fn current_round(&self) -> RoundId {
        self.desk.lock().accounts.current_round()
    }

    /// Live accepts recorded for a user in a round.
    #[must_use]
    pub fn accepts_in(&self, user: UserId, round: RoundId) -> u32 {
        self.desk.lock().accounts.accepts_in(user, round)
    }

    #[must_use]
    pub fn schedule(&self) -> &RoundSchedule {
        &self.schedule
    }

    // =================================================================
    // Reports
    // =================================================================

    /// Snapshot of a user's account.
    #[must_use]
    pub fn account(&self, user: UserId) -> UserAccount {
        self.desk.lock().accounts.account(user)
    }

    /// A user's recorded transactions, optionally only buys or only sells.
    #[must_use]
    pub fn statement(&self, user: UserId, filter: Option<OfferSide>) -> Statement {
        let desk = self.desk.lock();
        Statement::for_user(desk.log.transactions(), user, filter, &self.schedule)
    }

    /// Round penalties over the recorded ledger.
    #[must_use]
    pub fn evaluate_penalties(&self) -> Vec<RoundPenalty> {
        let desk = self.desk.lock();
        evaluate_round_penalties(desk.log.transactions(), &self.schedule)
    }

    /// Copy of the recorded ledger.
    #[must_use]
    pub fn transactions(&self) -> Vec<Transaction> {
        self.desk.lock().log.transactions().to_vec()
    }

    /// Active offers in a channel, in arrival order.
    #[must_use]
    pub fn open_offers(&self, channel: ChannelId) -> Vec<Offer> {
        self.books
            .get(&channel)
            .map(|book| book.lock().active_offers().cloned().collect())
            .unwrap_or_default()
    }

    /// Check money and hype conservation and fingerprint the ledger.
    ///
    /// # Errors
    /// Returns [`PaddockError::ConservationViolation`] if balances do not add up.
    pub fn audit(&self) -> Result<AuditReport> {
        let desk = self.desk.lock();
        desk.accounts.verify_conservation()?;
        Ok(AuditReport {
            transactions: desk.log.len(),
            accounts: desk.accounts.accounts().count(),
            total_money: desk.accounts.accounts().map(|(_, a)| a.money).sum(),
            fines_collected: desk.accounts.total_fines(),
            ledger_digest: ledger_digest_hex(desk.log.transactions()),
        })
    }

    // =================================================================
    // Lifecycle
    // =================================================================

    /// Write the ledger and counter out again.
    pub fn flush(&self) -> Result<()> {
        self.desk.lock().log.flush()?;
        tracing::info!("ledger flushed");
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }
}
