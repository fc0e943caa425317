//! Per-user account state derived from settlements.
//!
//! Every user has `money` (signed, fines can push it below zero), a per-channel
//! `hype` position counter, and a stock of `garnets` that waive fines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ChannelId, constants};

/// Account state for a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub money: i64,
    /// Net position per channel: +1 per buy, -1 per sell. Unbounded.
    pub hype: HashMap<ChannelId, i64>,
    pub garnets: u32,
}

impl UserAccount {
    /// A fresh account with the starting allowance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            money: constants::STARTING_MONEY,
            hype: HashMap::new(),
            garnets: constants::STARTING_GARNETS,
        }
    }

    /// Hype held in one channel (zero if never traded there).
    #[must_use]
    pub fn hype_in(&self, channel: ChannelId) -> i64 {
        self.hype.get(&channel).copied().unwrap_or(0)
    }

    /// Whether a penalty could be waived with a garnet right now.
    #[must_use]
    pub fn has_garnet(&self) -> bool {
        self.garnets > 0
    }
}

impl Default for UserAccount {
    fn default() -> Self {
        Self::new()
    }
}
