//! Money conservation invariant checker.
//!
//! Trades only move money between accounts; fines are the only sink:
//! ```text
//! Σ money == STARTING_MONEY × accounts − Σ fines
//! ```
//!
//! Hype is zero-sum per channel:
//! ```text
//! ∀ channel: Σ hype[channel] == 0
//! ```

use std::collections::HashMap;

use paddock_types::{ChannelId, PaddockError, Result, UserAccount, constants};

/// Tracks the money that entered (account creation) and left (fines) the
/// system, and checks live balances against it.
#[derive(Debug, Default)]
pub struct MoneyConservation {
    accounts_opened: u64,
    fines_collected: i64,
}

impl MoneyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a lazily created account.
    pub fn record_account(&mut self) {
        self.accounts_opened += 1;
    }

    /// Record a fine debited from some account.
    pub fn record_fine(&mut self, amount: i64) {
        self.fines_collected += amount;
    }

    /// Money that should exist across all accounts.
    #[must_use]
    pub fn expected_supply(&self) -> i64 {
        let opened = i64::try_from(self.accounts_opened).unwrap_or(i64::MAX);
        opened.saturating_mul(constants::STARTING_MONEY) - self.fines_collected
    }

    #[must_use]
    pub fn accounts_opened(&self) -> u64 {
        self.accounts_opened
    }

    #[must_use]
    pub fn fines_collected(&self) -> i64 {
        self.fines_collected
    }

    /// Check money and hype conservation over the given accounts.
    ///
    /// # Errors
    /// Returns [`PaddockError::ConservationViolation`] describing the first
    /// imbalance found.
    pub fn verify<'a>(&self, accounts: impl IntoIterator<Item = &'a UserAccount>) -> Result<()> {
        let mut count = 0_u64;
        let mut money = 0_i64;
        let mut hype: HashMap<ChannelId, i64> = HashMap::new();
        for account in accounts {
            count += 1;
            money += account.money;
            for (channel, h) in &account.hype {
                *hype.entry(*channel).or_insert(0) += h;
            }
        }

        if count != self.accounts_opened {
            return Err(PaddockError::ConservationViolation {
                reason: format!(
                    "{count} accounts present, {} were opened",
                    self.accounts_opened
                ),
            });
        }
        let expected = self.expected_supply();
        if money != expected {
            return Err(PaddockError::ConservationViolation {
                reason: format!(
                    "money {money} != expected {expected} (accounts={}, fines={})",
                    self.accounts_opened, self.fines_collected
                ),
            });
        }
        if let Some((channel, net)) = hype.into_iter().find(|(_, net)| *net != 0) {
            return Err(PaddockError::ConservationViolation {
                reason: format!("hype in {channel} nets to {net}"),
            });
        }
        Ok(())
    }
}
