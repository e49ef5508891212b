//! Teacher (invigilator) model.
//!
//! A teacher holds one academic rank for the lifetime of a run and carries
//! a running count of the periods (slot-roles) assigned so far. The count
//! only ever grows during a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Academic rank of a teacher.
///
/// The set is closed. Ordering follows declaration order, which is also
/// seniority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Senior staff. The only rank allowed to supervise.
    Senior,
    /// Lecturer.
    Lecturer,
    /// Assistant lecturer.
    AssistantLecturer,
    /// Tutor / teaching assistant.
    Tutor,
}

impl Rank {
    /// The rank every supervisor must hold.
    pub const SUPERVISOR: Rank = Rank::Senior;

    /// Assistant ranks in pairing preference order.
    pub const ASSISTANT_PREFERENCE: [Rank; 3] =
        [Rank::Lecturer, Rank::AssistantLecturer, Rank::Tutor];

    /// All ranks, most senior first.
    pub const ALL: [Rank; 4] = [
        Rank::Senior,
        Rank::Lecturer,
        Rank::AssistantLecturer,
        Rank::Tutor,
    ];

    /// Whether this rank may supervise a slot.
    #[inline]
    pub fn can_supervise(self) -> bool {
        self == Self::SUPERVISOR
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Rank::Senior => "Senior",
            Rank::Lecturer => "Lecturer",
            Rank::AssistantLecturer => "Assistant Lecturer",
            Rank::Tutor => "Tutor",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A person who can invigilate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Academic rank (immutable).
    pub rank: Rank,
    /// Periods assigned so far, including previously committed ones.
    pub periods: u32,
    /// Dates the teacher cannot invigilate on.
    #[serde(default)]
    pub unavailable_dates: BTreeSet<NaiveDate>,
}

impl Teacher {
    /// Creates an available teacher with no periods assigned.
    pub fn new(id: impl Into<String>, rank: Rank) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            rank,
            periods: 0,
            unavailable_dates: BTreeSet::new(),
        }
    }

    /// Creates a senior teacher.
    pub fn senior(id: impl Into<String>) -> Self {
        Self::new(id, Rank::Senior)
    }

    /// Creates a lecturer.
    pub fn lecturer(id: impl Into<String>) -> Self {
        Self::new(id, Rank::Lecturer)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the starting period count.
    pub fn with_periods(mut self, periods: u32) -> Self {
        self.periods = periods;
        self
    }

    /// Marks the teacher unavailable on a date.
    pub fn unavailable_on(mut self, date: NaiveDate) -> Self {
        self.unavailable_dates.insert(date);
        self
    }

    /// Availability flag for a date.
    #[inline]
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        !self.unavailable_dates.contains(&date)
    }
}
