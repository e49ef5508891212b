//! Coverage slot model.
//!
//! A coverage slot is one exam room on one date and session that needs a
//! supervisor and, ideally, an assistant.
//!
//! # Time Model
//! Dates are calendar dates (`NaiveDate`). The exam window is a half-open
//! wall-clock interval `[start, end)` on that date.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exam session within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Session {
    Morning,
    Afternoon,
    Evening,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Session::Morning => "morning",
            Session::Afternoon => "afternoon",
            Session::Evening => "evening",
        };
        f.write_str(label)
    }
}

/// A wall-clock interval [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamWindow {
    /// Interval start (inclusive).
    pub start: NaiveTime,
    /// Interval end (exclusive).
    pub end: NaiveTime,
}

impl ExamWindow {
    /// Creates a new window.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Builds a window from hour/minute pairs. Returns `None` on invalid times.
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        Some(Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0)?,
            end: NaiveTime::from_hms_opt(end.0, end.1, 0)?,
        })
    }

    /// Length of the window in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for ExamWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// One room needing invigilation on one date/session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSlot {
    /// Room identifier as known to the operator.
    pub room_id: String,
    /// Exam date.
    pub date: NaiveDate,
    /// Session within the day.
    pub session: Session,
    /// Exam time window.
    pub window: ExamWindow,
    /// Recurring room/student-group identity used for pair rotation.
    pub history_key: String,
}

impl CoverageSlot {
    /// Creates a slot. The history key defaults to the room identifier.
    pub fn new(
        room_id: impl Into<String>,
        date: NaiveDate,
        session: Session,
        window: ExamWindow,
    ) -> Self {
        let room_id = room_id.into();
        Self {
            history_key: room_id.clone(),
            room_id,
            date,
            session,
            window,
        }
    }

    /// Overrides the history key.
    pub fn with_history_key(mut self, key: impl Into<String>) -> Self {
        self.history_key = key.into();
        self
    }

    /// Room/date key, as used for existing-assignment counts.
    pub fn key(&self) -> String {
        format!("{}|{}", self.room_id, self.date)
    }
}
