//! Pair-type rotation counters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::Rank;

/// A supervisor-rank/assistant-rank combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairType {
    pub supervisor: Rank,
    pub assistant: Rank,
}

impl PairType {
    /// Normal pair types in preference order.
    pub const NORMAL: [PairType; 3] = [
        PairType::with_assistant(Rank::ASSISTANT_PREFERENCE[0]),
        PairType::with_assistant(Rank::ASSISTANT_PREFERENCE[1]),
        PairType::with_assistant(Rank::ASSISTANT_PREFERENCE[2]),
    ];

    /// Supervisor rank paired with `assistant`.
    pub const fn with_assistant(assistant: Rank) -> Self {
        Self {
            supervisor: Rank::SUPERVISOR,
            assistant,
        }
    }
}

impl fmt::Display for PairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.supervisor, self.assistant)
    }
}

/// How often each pair type has been used on one date.
#[derive(Debug, Clone, Default)]
pub struct PairTypeUsage {
    counts: BTreeMap<PairType, u32>,
}

impl PairTypeUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses of a pair type so far.
    pub fn count(&self, pair_type: PairType) -> u32 {
        self.counts.get(&pair_type).copied().unwrap_or(0)
    }

    /// Counts one use.
    pub fn mark_used(&mut self, pair_type: PairType) {
        *self.counts.entry(pair_type).or_insert(0) += 1;
    }

    /// Least-used pair type among `viable`; ties go to the earliest entry.
    pub fn least_used(&self, viable: &[PairType]) -> Option<PairType> {
        viable.iter().copied().min_by_key(|pt| self.count(*pt))
    }
}
