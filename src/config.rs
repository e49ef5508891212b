//! Operator-facing options.
//!
//! - [`RankLimits`]: per-rank cap on periods, editable during a session,
//!   persisted client-side as JSON, with a restore-defaults action.
//! - [`BatchScope`]: which rooms a run covers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CoverageSlot, Rank};

/// Errors while loading or storing operator options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("rank limit table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rank limit for {rank} must be at least 1, got {value}")]
    LimitTooLow { rank: Rank, value: u32 },
}

/// Per-rank cap on assigned periods.
///
/// A rank without an entry is unrestricted.
///
/// # Example
/// ```
/// use u_invigilate::config::RankLimits;
/// use u_invigilate::models::Rank;
///
/// let mut limits = RankLimits::empty().with_limit(Rank::Senior, 5);
/// assert_eq!(limits.limit_for(Rank::Senior), Some(5));
/// assert_eq!(limits.limit_for(Rank::Tutor), None);
///
/// limits.restore_defaults();
/// assert_eq!(limits, RankLimits::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankLimits {
    limits: BTreeMap<Rank, u32>,
}

impl RankLimits {
    /// Default table shipped to operators.
    pub const DEFAULTS: [(Rank, u32); 4] = [
        (Rank::Senior, 6),
        (Rank::Lecturer, 8),
        (Rank::AssistantLecturer, 10),
        (Rank::Tutor, 12),
    ];

    /// A table with no limits at all.
    pub fn empty() -> Self {
        Self {
            limits: BTreeMap::new(),
        }
    }

    /// Sets a limit (builder form).
    pub fn with_limit(mut self, rank: Rank, max_periods: u32) -> Self {
        self.set(rank, max_periods);
        self
    }

    /// Sets or replaces a rank's limit.
    pub fn set(&mut self, rank: Rank, max_periods: u32) {
        self.limits.insert(rank, max_periods);
    }

    /// Removes a rank's limit, leaving it unrestricted.
    pub fn remove(&mut self, rank: Rank) -> Option<u32> {
        self.limits.remove(&rank)
    }

    /// The configured limit for a rank.
    #[inline]
    pub fn limit_for(&self, rank: Rank) -> Option<u32> {
        self.limits.get(&rank).copied()
    }

    /// Whether `periods` is still under the rank's cap.
    #[inline]
    pub fn allows(&self, rank: Rank, periods: u32) -> bool {
        self.limit_for(rank).map_or(true, |limit| periods < limit)
    }

    /// Replaces the table with the default one.
    pub fn restore_defaults(&mut self) {
        *self = Self::default();
    }

    /// Iterates `(rank, limit)` in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, u32)> + '_ {
        self.limits.iter().map(|(r, l)| (*r, *l))
    }

    /// Checks every entry is at least 1.
    pub fn check(&self) -> Result<(), ConfigError> {
        match self.iter().find(|(_, value)| *value < 1) {
            Some((rank, value)) => Err(ConfigError::LimitTooLow { rank, value }),
            None => Ok(()),
        }
    }

    /// Parses a table stored as `{"Senior": 5, ...}` and checks it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let limits: Self = serde_json::from_str(json)?;
        limits.check()?;
        Ok(limits)
    }

    /// Serializes the table for client-side storage.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            limits: Self::DEFAULTS.into_iter().collect(),
        }
    }
}

/// Which rooms a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchScope {
    /// Every visible room.
    #[default]
    AllVisible,
    /// Only the operator-selected rooms.
    Selected(BTreeSet<String>),
}

impl BatchScope {
    /// Scope over an explicit set of rooms.
    pub fn selected<I, S>(rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selected(rooms.into_iter().map(Into::into).collect())
    }

    /// Whether a room falls inside the scope.
    pub fn includes(&self, room_id: &str) -> bool {
        match self {
            BatchScope::AllVisible => true,
            BatchScope::Selected(rooms) => rooms.contains(room_id),
        }
    }

    /// Filters slots to the scope, keeping their order.
    pub fn apply(&self, slots: &[CoverageSlot]) -> Vec<CoverageSlot> {
        slots
            .iter()
            .filter(|s| self.includes(&s.room_id))
            .cloned()
            .collect()
    }
}
