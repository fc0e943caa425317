//! Channel administration.
//!
//! Which channels trade, which horse each one trades, which are closed, and
//! where transaction logs go. All of it lives in the shared
//! [`MarketConfig`](paddock_types::MarketConfig) and every change is
//! persisted before it takes effect.

use std::sync::Arc;

use paddock_types::{ChannelId, ConfigStore, PaddockError, Result, constants};
use serde::{Deserialize, Serialize};

/// Whether a channel accepts offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    Enabled,
    /// Closed for trading. Takes precedence over being enabled.
    Closed,
    NotEnabled,
}

/// Channel admin operations over the shared configuration.
#[derive(Clone)]
pub struct ChannelRegistry {
    config: Arc<ConfigStore>,
}

impl ChannelRegistry {
    #[must_use]
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    /// Enable trading in a channel, optionally assigning a horse label
    /// (`A`–`G`, case-insensitive). Re-enabling replaces the label.
    ///
    /// A closed channel stays closed.
    pub fn enable_channel(&self, channel: ChannelId, horse: Option<char>) -> Result<()> {
        let horse = horse.map(normalize_horse).transpose()?;
        self.config.update(|cfg| {
            cfg.horses.insert(channel, horse);
        })?;
        tracing::info!(channel = %channel, ?horse, "channel enabled for trading");
        Ok(())
    }

    /// Close a channel for trading. Returns `false` if it was already closed.
    pub fn close_channel(&self, channel: ChannelId) -> Result<bool> {
        let newly_closed = self.config.update(|cfg| cfg.closed_channels.insert(channel))?;
        if newly_closed {
            tracing::info!(channel = %channel, "channel closed for trading");
        }
        Ok(newly_closed)
    }

    pub fn set_log_channel(&self, channel: ChannelId) -> Result<()> {
        self.config.update(|cfg| cfg.log_channel = Some(channel))?;
        tracing::info!(channel = %channel, "log channel set");
        Ok(())
    }

    #[must_use]
    pub fn log_channel(&self) -> Option<ChannelId> {
        self.config.read(|cfg| cfg.log_channel)
    }

    #[must_use]
    pub fn channel_state(&self, channel: ChannelId) -> ChannelState {
        self.config.read(|cfg| {
            if cfg.closed_channels.contains(&channel) {
                ChannelState::Closed
            } else if cfg.horses.contains_key(&channel) {
                ChannelState::Enabled
            } else {
                ChannelState::NotEnabled
            }
        })
    }

    /// The horse a channel trades, if one was assigned.
    #[must_use]
    pub fn horse_label(&self, channel: ChannelId) -> Option<char> {
        self.config
            .read(|cfg| cfg.horses.get(&channel).copied().flatten())
    }
}

fn normalize_horse(label: char) -> Result<char> {
    let upper = label.to_ascii_uppercase();
    if constants::HORSE_LABELS.contains(&upper) {
        Ok(upper)
    } else {
        Err(PaddockError::InvalidHorseLabel(label))
    }
}
