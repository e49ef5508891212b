//! Plan (solution) model.
//!
//! A run produces one [`SlotPreview`] per coverage slot and one
//! [`PlannedAssignment`] per filled role. Previews are always present,
//! even for slots that could not be covered, so every slot ends a run with
//! an explicit status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CoverageSlot, ExamWindow, Rank, Session};

/// Persisted room-linkage identifier for a room on a date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkageId(pub String);

impl LinkageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invigilation role on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Supervisor,
    Assistant,
}

/// A resolved (or attempted) supervisor + assistant choice for one slot.
///
/// Invariant: `supervisor != assistant` when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub supervisor: Option<String>,
    pub assistant: Option<String>,
}

impl PairRecord {
    /// Whether at least one role was filled.
    pub fn is_filled(&self) -> bool {
        self.supervisor.is_some() || self.assistant.is_some()
    }

    /// Whether this record pairs exactly these two teachers in these roles.
    pub fn pairs(&self, supervisor: &str, assistant: &str) -> bool {
        self.supervisor.as_deref() == Some(supervisor)
            && self.assistant.as_deref() == Some(assistant)
    }
}

/// One teacher's role on one slot, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssignment {
    /// Slot linkage the row attaches to.
    pub linkage: LinkageId,
    /// Assigned teacher.
    pub teacher_id: String,
    /// Role on the slot.
    pub role: Role,
    /// Exam date (denormalized for the gateway).
    pub date: NaiveDate,
    /// Session (denormalized).
    pub session: Session,
    /// Exam window (denormalized).
    pub window: ExamWindow,
}

impl PlannedAssignment {
    /// Creates an assignment row for a slot.
    pub fn for_slot(
        slot: &CoverageSlot,
        linkage: LinkageId,
        teacher_id: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            linkage,
            teacher_id: teacher_id.into(),
            role,
            date: slot.date,
            session: slot.session,
            window: slot.window,
        }
    }
}

/// How a slot's pair came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingKind {
    /// Supervisor paired with an assistant of the given ordinary rank.
    Normal(Rank),
    /// The chosen pair type's rank ran dry; any ordinary-rank assistant was taken.
    AnyRank(Rank),
    /// Two supervisor-rank teachers (quota-gated fallback).
    Scarce,
    /// Supervisor only; no assistant could be found or the quota was spent.
    SupervisorOnly,
    /// No eligible supervisor.
    Uncovered,
    /// The room/date did not resolve to a persisted linkage.
    Unresolved,
}

impl PairingKind {
    /// Whether the pairing used the scarce senior+senior fallback.
    #[inline]
    pub fn is_scarce(self) -> bool {
        self == PairingKind::Scarce
    }
}

/// Per-slot outcome shown to the operator before commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPreview {
    pub room_id: String,
    pub date: NaiveDate,
    pub session: Session,
    /// Resolved linkage, if any.
    pub linkage: Option<LinkageId>,
    pub supervisor: Option<String>,
    pub assistant: Option<String>,
    pub pairing: PairingKind,
    /// `true` when at least one role was filled.
    pub ok: bool,
    /// Reason for failure (`None` when `ok`).
    pub message: Option<String>,
}

impl SlotPreview {
    /// Message for slots whose room/date has no persisted linkage.
    pub const ROOM_NOT_FOUND: &'static str = "Room not found for this date";
    /// Message for slots where no teacher was eligible.
    pub const NO_TEACHERS: &'static str = "No available teachers";

    /// Preview for a slot that could not be resolved.
    pub fn unresolved(slot: &CoverageSlot) -> Self {
        Self {
            room_id: slot.room_id.clone(),
            date: slot.date,
            session: slot.session,
            linkage: None,
            supervisor: None,
            assistant: None,
            pairing: PairingKind::Unresolved,
            ok: false,
            message: Some(Self::ROOM_NOT_FOUND.to_string()),
        }
    }

    /// Preview for a resolved slot with the given pair outcome.
    pub fn resolved(
        slot: &CoverageSlot,
        linkage: LinkageId,
        pair: &PairRecord,
        pairing: PairingKind,
    ) -> Self {
        let ok = pair.is_filled();
        Self {
            room_id: slot.room_id.clone(),
            date: slot.date,
            session: slot.session,
            linkage: Some(linkage),
            supervisor: pair.supervisor.clone(),
            assistant: pair.assistant.clone(),
            pairing,
            ok,
            message: if ok {
                None
            } else {
                Some(Self::NO_TEACHERS.to_string())
            },
        }
    }

    /// Number of roles filled (0..=2).
    pub fn filled_roles(&self) -> usize {
        usize::from(self.supervisor.is_some()) + usize::from(self.assistant.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> CoverageSlot {
        CoverageSlot::new(
            "H-1",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Session::Morning,
            ExamWindow::from_hm((9, 0), (11, 0)).unwrap(),
        )
    }

    #[test]
    fn test_pair_record_matching() {
        let pair = PairRecord {
            supervisor: Some("S1".into()),
            assistant: Some("A1".into()),
        };
        assert!(pair.is_filled());
        assert!(pair.pairs("S1", "A1"));
        assert!(!pair.pairs("A1", "S1"));
        assert!(!PairRecord::default().is_filled());
    }

    #[test]
    fn test_unresolved_preview() {
        let p = SlotPreview::unresolved(&slot());
        assert!(!p.ok);
        assert_eq!(p.message.as_deref(), Some("Room not found for this date"));
        assert_eq!(p.pairing, PairingKind::Unresolved);
        assert_eq!(p.filled_roles(), 0);
    }

    #[test]
    fn test_resolved_preview_status() {
        let supervisor_only = PairRecord {
            supervisor: Some("S1".into()),
            assistant: None,
        };
        let p = SlotPreview::resolved(
            &slot(),
            LinkageId::new("L1"),
            &supervisor_only,
            PairingKind::SupervisorOnly,
        );
        assert!(p.ok);
        assert!(p.message.is_none());
        assert_eq!(p.filled_roles(), 1);

        let empty = SlotPreview::resolved(
            &slot(),
            LinkageId::new("L1"),
            &PairRecord::default(),
            PairingKind::Uncovered,
        );
        assert!(!empty.ok);
        assert_eq!(empty.message.as_deref(), Some("No available teachers"));
    }

    #[test]
    fn test_planned_assignment_copies_slot_fields() {
        let s = slot();
        let a = PlannedAssignment::for_slot(&s, LinkageId::new("L1"), "T1", Role::Assistant);
        assert_eq!(a.date, s.date);
        assert_eq!(a.session, Session::Morning);
        assert_eq!(a.window, s.window);
        assert_eq!(a.linkage.as_str(), "L1");
    }
}
