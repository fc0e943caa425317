//! Market configuration and its on-disk store.
//!
//! The configuration file is shared with the messaging collaborator: it owns
//! the channel lists and the log channel, and the engine writes back
//! `trade_counter` after every settlement. All writes go through
//! [`ConfigStore::update`], which persists atomically before the in-memory
//! copy changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ChannelId, PaddockError, Result, RoundId, RoundSchedule};

/// What happens when an incoming offer would cross the same user's own
/// resting offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfMatchPolicy {
    /// Own offers are never candidates; the next best offer is used instead.
    #[default]
    Skip,
    /// Own offers match like anyone else's.
    Allow,
}

/// One configured round boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEnd {
    pub round: RoundId,
    pub ends_at: DateTime<Utc>,
}

/// Trading configuration shared with the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Channels enabled for trading, with the horse label each one trades
    /// (if assigned).
    #[serde(default)]
    pub horses: BTreeMap<ChannelId, Option<char>>,
    /// Channels where trading has been suspended.
    #[serde(default, deserialize_with = "lenient_id_set")]
    pub closed_channels: BTreeSet<ChannelId>,
    /// Where the collaborator posts transaction logs.
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub log_channel: Option<ChannelId>,
    /// Last transaction id issued (0 before the first settlement).
    #[serde(default)]
    pub trade_counter: u64,
    #[serde(default)]
    pub self_match: SelfMatchPolicy,
    /// Round boundaries; the built-in season table is used when empty.
    #[serde(default)]
    pub round_ends: Vec<RoundEnd>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            horses: BTreeMap::new(),
            closed_channels: BTreeSet::new(),
            log_channel: None,
            trade_counter: 0,
            self_match: SelfMatchPolicy::default(),
            round_ends: Vec::new(),
        }
    }
}

impl MarketConfig {
    /// The round schedule this configuration describes.
    pub fn schedule(&self) -> Result<RoundSchedule> {
        if self.round_ends.is_empty() {
            RoundSchedule::season()
        } else {
            Ok(RoundSchedule::new(
                self.round_ends
                    .iter()
                    .map(|r| (r.round, r.ends_at))
                    .collect(),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient id decoding
// ---------------------------------------------------------------------------

// Older config files store channel ids as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Num(u64),
    Text(String),
}

impl IdRepr {
    fn into_id<E: serde::de::Error>(self) -> std::result::Result<ChannelId, E> {
        match self {
            Self::Num(n) => Ok(ChannelId(n)),
            Self::Text(s) => s
                .trim()
                .parse()
                .map(ChannelId)
                .map_err(|_| E::custom(format!("invalid channel id {s:?}"))),
        }
    }
}

fn lenient_id_set<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<ChannelId>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<IdRepr>::deserialize(deserializer)?
        .into_iter()
        .map(IdRepr::into_id)
        .collect()
}

fn lenient_optional_id<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<ChannelId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IdRepr>::deserialize(deserializer)?
        .map(IdRepr::into_id)
        .transpose()
}

// ---------------------------------------------------------------------------
// Atomic JSON writes
// ---------------------------------------------------------------------------

/// Serialize `value` and replace `path` with it atomically (temp file, fsync,
/// rename). Parent directories are created as needed.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&body)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Shared, persisted [`MarketConfig`].
pub struct ConfigStore {
    /// `None` keeps the configuration in memory only.
    path: Option<PathBuf>,
    current: Mutex<MarketConfig>,
}

impl ConfigStore {
    /// Load the configuration at `path`, writing defaults if it is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = if path.exists() {
            let raw = fs::read(&path)?;
            serde_json::from_slice(&raw).map_err(|e| {
                PaddockError::Configuration(format!("{}: {e}", path.display()))
            })?
        } else {
            tracing::info!(path = %path.display(), "config missing, writing defaults");
            let config = MarketConfig::default();
            write_json_atomic(&path, &config)?;
            config
        };
        Ok(Self {
            path: Some(path),
            current: Mutex::new(config),
        })
    }

    /// A store that never touches disk.
    #[must_use]
    pub fn in_memory(config: MarketConfig) -> Self {
        Self {
            path: None,
            current: Mutex::new(config),
        }
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> MarketConfig {
        self.current.lock().clone()
    }

    /// Read a value without cloning the whole configuration.
    pub fn read<R>(&self, f: impl FnOnce(&MarketConfig) -> R) -> R {
        f(&self.current.lock())
    }

    /// Apply `f` to a copy, persist the copy, then make it current.
    ///
    /// If persisting fails the in-memory configuration is left unchanged.
    pub fn update<R>(&self, f: impl FnOnce(&mut MarketConfig) -> R) -> Result<R> {
        let mut current = self.current.lock();
        let mut next = current.clone();
        let out = f(&mut next);
        if next != *current {
            if let Some(path) = &self.path {
                write_json_atomic(path, &next)
                    .map_err(|e| PaddockError::Persistence(format!("{}: {e}", path.display())))?;
            }
            *current = next;
        }
        Ok(out)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MarketConfig::default();
        assert!(cfg.horses.is_empty());
        assert!(cfg.closed_channels.is_empty());
        assert_eq!(cfg.trade_counter, 0);
        assert_eq!(cfg.self_match, SelfMatchPolicy::Skip);
        assert_eq!(cfg.schedule().unwrap().len(), 17);
    }

    #[test]
    fn legacy_string_ids_are_accepted() {
        let json = r#"{
            "horses": {"111": "A"},
            "closed_channels": ["222", 333],
            "log_channel": "444",
            "trade_counter": 9
        }"#;
        let cfg: MarketConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.horses.get(&ChannelId(111)), Some(&Some('A')));
        assert!(cfg.closed_channels.contains(&ChannelId(222)));
        assert!(cfg.closed_channels.contains(&ChannelId(333)));
        assert_eq!(cfg.log_channel, Some(ChannelId(444)));
        assert_eq!(cfg.trade_counter, 9);
    }

    #[test]
    fn garbage_channel_id_is_rejected() {
        let json = r#"{"closed_channels": ["general"]}"#;
        assert!(serde_json::from_str::<MarketConfig>(json).is_err());
    }

    #[test]
    fn custom_round_ends_override_season() {
        let cfg = MarketConfig {
            round_ends: vec![RoundEnd {
                round: RoundId(1),
                ends_at: Utc::now(),
            }],
            ..MarketConfig::default()
        };
        assert_eq!(cfg.schedule().unwrap().len(), 1);
    }

    #[test]
    fn open_missing_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("config.json");
        let store = ConfigStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.snapshot(), MarketConfig::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::open(&path).unwrap();
        store
            .update(|cfg| {
                cfg.trade_counter = 12;
                cfg.horses.insert(ChannelId(5), Some('C'));
            })
            .unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.read(|c| c.trade_counter), 12);
        assert_eq!(reopened.read(|c| c.horses.get(&ChannelId(5)).copied()), Some(Some('C')));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let store = ConfigStore {
            path: Some(blocker.join("config.json")),
            current: Mutex::new(MarketConfig::default()),
        };
        let err = store.update(|cfg| cfg.trade_counter = 3).unwrap_err();
        assert!(matches!(err, PaddockError::Persistence(_)));
        assert_eq!(store.read(|c| c.trade_counter), 0);
    }

    #[test]
    fn in_memory_store_updates() {
        let store = ConfigStore::in_memory(MarketConfig::default());
        store.update(|cfg| cfg.trade_counter = 1).unwrap();
        assert_eq!(store.snapshot().trade_counter, 1);
        assert!(store.path().is_none());
    }
}
