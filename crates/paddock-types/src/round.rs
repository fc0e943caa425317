//! Round model for retrospective penalty evaluation.
//!
//! A round is a historical time window closed by an end timestamp. Rounds are
//! half-open: a timestamp exactly on a boundary belongs to the round that the
//! boundary closes, not the next one.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PaddockError, Result};

/// Round end timestamps of the 2025 season.
///
/// R05 and R06 share an end; the earlier label wins for any transaction at or
/// before it, so R06 is always empty.
pub const SEASON_ROUND_ENDS: [(&str, &str); 17] = [
    ("R01", "2025-05-16T23:54:59.944Z"),
    ("R02", "2025-05-17T00:16:58.652Z"),
    ("R03", "2025-05-17T00:25:46.024Z"),
    ("R04", "2025-05-17T00:33:45.215Z"),
    ("R05", "2025-05-17T00:43:10.634Z"),
    ("R06", "2025-05-17T00:43:10.634Z"),
    ("R07", "2025-05-17T00:53:09.935Z"),
    ("R08", "2025-05-17T00:59:31.789Z"),
    ("R09", "2025-05-17T01:05:29.897Z"),
    ("R10", "2025-05-17T01:10:18.513Z"),
    ("R11", "2025-05-17T01:15:33.437Z"),
    ("R12", "2025-05-17T01:20:24.475Z"),
    ("R13", "2025-05-17T01:25:45.485Z"),
    ("R14", "2025-05-17T01:30:27.362Z"),
    ("R15", "2025-05-17T01:35:18.427Z"),
    ("R16", "2025-05-17T01:40:18.568Z"),
    ("R17", "2025-05-17T01:45:52.839Z"),
];

// ---------------------------------------------------------------------------
// RoundId
// ---------------------------------------------------------------------------

/// Round number, displayed and serialized as `R01`, `R02`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoundId(pub u32);

impl RoundId {
    /// The first round of a session.
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{:02}", self.0)
    }
}

impl FromStr for RoundId {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .trim()
            .strip_prefix(['R', 'r'])
            .ok_or_else(|| PaddockError::Configuration(format!("bad round label {s:?}")))?;
        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| PaddockError::Configuration(format!("bad round label {s:?}")))
    }
}

impl TryFrom<String> for RoundId {
    type Error = PaddockError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RoundId> for String {
    fn from(value: RoundId) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// RoundSchedule
// ---------------------------------------------------------------------------

/// Ordered table of round end timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSchedule {
    /// Sorted ascending by end; equal ends keep their input order.
    ends: Vec<(RoundId, DateTime<Utc>)>,
}

impl RoundSchedule {
    /// Build a schedule from `(round, end)` pairs in any order.
    #[must_use]
    pub fn new(mut ends: Vec<(RoundId, DateTime<Utc>)>) -> Self {
        ends.sort_by_key(|(_, end)| *end);
        Self { ends }
    }

    /// Build a schedule from `(label, RFC 3339 timestamp)` pairs.
    pub fn from_labels(table: &[(&str, &str)]) -> Result<Self> {
        let mut ends = Vec::with_capacity(table.len());
        for (label, end) in table {
            let round: RoundId = label.parse()?;
            let end = DateTime::parse_from_rfc3339(end)
                .map_err(|e| PaddockError::Configuration(format!("round {label}: {e}")))?
                .with_timezone(&Utc);
            ends.push((round, end));
        }
        Ok(Self::new(ends))
    }

    /// The built-in season table.
    pub fn season() -> Result<Self> {
        Self::from_labels(&SEASON_ROUND_ENDS)
    }

    /// The round a timestamp belongs to, or `None` past the last end.
    #[must_use]
    pub fn round_for(&self, at: DateTime<Utc>) -> Option<RoundId> {
        self.ends
            .iter()
            .find(|(_, end)| at <= *end)
            .map(|(round, _)| *round)
    }

    /// End of the last listed round.
    #[must_use]
    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.ends.last().map(|(_, end)| *end)
    }

    /// Iterate `(round, end)` in ascending end order.
    pub fn iter(&self) -> impl Iterator<Item = &(RoundId, DateTime<Utc>)> {
        self.ends.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}
