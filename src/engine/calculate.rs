//! Run calculation over a batch of coverage slots.
//!
//! # Algorithm
//!
//! Slots are processed one at a time, in the order given. For each slot:
//!
//! 1. The date's used-today set is seeded lazily from the snapshot's busy
//!    set, together with a per-date pair-type counter.
//! 2. The room/date is resolved to a linkage. Unresolved slots get a failed
//!    preview and the run moves on.
//! 3. The selector picks a pair from the date's eligible candidates, with
//!    scarce pairing allowed only while the slot's quota window is unused.
//! 4. Chosen teachers are marked used for the date, their workload is
//!    bumped in the snapshot, and one planned row per filled role is emitted.
//! 5. The pair is appended to the history key's pair history.
//!
//! No I/O happens here; the resolver is an in-memory lookup.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use super::context::ContextSnapshot;
use super::history::PairHistory;
use super::pairing::{pick_paired_teachers, SlotContext};
use super::quota::QuotaTracker;
use super::usage::PairTypeUsage;
use crate::config::RankLimits;
use crate::gateway::SlotResolver;
use crate::models::{CoverageSlot, PlannedAssignment, Role, SlotPreview};

/// Mutable bookkeeping threaded through one calculation.
#[derive(Debug, Clone, Default)]
pub struct CalculationState {
    used_by_date: BTreeMap<NaiveDate, HashSet<String>>,
    usage_by_date: BTreeMap<NaiveDate, PairTypeUsage>,
    /// Pairs made so far per history key.
    pub history: PairHistory,
    /// Scarce-pairing quota per date window.
    pub quota: QuotaTracker,
}

impl CalculationState {
    /// Fresh state with quota windows built from the slots' dates.
    pub fn for_slots(slots: &[CoverageSlot]) -> Self {
        Self {
            quota: QuotaTracker::from_dates(slots.iter().map(|s| s.date)),
            ..Self::default()
        }
    }

    /// Teachers placed (or already busy) on a date, once that date was reached.
    pub fn used_on(&self, date: NaiveDate) -> Option<&HashSet<String>> {
        self.used_by_date.get(&date)
    }

    /// Pair-type counters for a date, once that date was reached.
    pub fn usage_on(&self, date: NaiveDate) -> Option<&PairTypeUsage> {
        self.usage_by_date.get(&date)
    }
}

/// Previews and planned rows produced by a calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationOutcome {
    /// One entry per input slot, in input order.
    pub previews: Vec<SlotPreview>,
    /// One row per filled role.
    pub assignments: Vec<PlannedAssignment>,
}

impl CalculationOutcome {
    /// Slots with at least one role filled.
    pub fn ok_count(&self) -> usize {
        self.previews.iter().filter(|p| p.ok).count()
    }
}

/// Computes a plan for `slots` against `snapshot`.
///
/// Mutates the snapshot's running period counts and `state`; the result is
/// a pure function of these inputs.
pub fn calculate_assignments<R>(
    slots: &[CoverageSlot],
    limits: &RankLimits,
    snapshot: &mut ContextSnapshot,
    resolver: &R,
    state: &mut CalculationState,
) -> CalculationOutcome
where
    R: SlotResolver + ?Sized,
{
    let mut outcome = CalculationOutcome::default();

    for slot in slots {
        let date = slot.date;
        let used = state
            .used_by_date
            .entry(date)
            .or_insert_with(|| snapshot.busy_on(date));
        let usage = state.usage_by_date.entry(date).or_default();

        let Some(linkage) = resolver.resolve_slot_linkage(&slot.room_id, date) else {
            warn!(room = %slot.room_id, %date, "room not found for this date");
            outcome.previews.push(SlotPreview::unresolved(slot));
            continue;
        };

        let selection = {
            let (supervisors, assistants) = snapshot.candidates(date, limits, used);
            let ctx = SlotContext {
                date,
                limits,
                used_today: used,
                history: state.history.records(&slot.history_key),
                scarce_allowed: state.quota.is_allowed(date),
            };
            pick_paired_teachers(&supervisors, &assistants, &ctx, usage)
        };

        if selection.kind.is_scarce() {
            state.quota.record_use(date);
        }

        let roles = [
            (Role::Supervisor, &selection.pair.supervisor),
            (Role::Assistant, &selection.pair.assistant),
        ];
        for (role, teacher_id) in roles {
            let Some(teacher_id) = teacher_id else {
                continue;
            };
            used.insert(teacher_id.clone());
            snapshot.record_period(teacher_id);
            outcome.assignments.push(PlannedAssignment::for_slot(
                slot,
                linkage.clone(),
                teacher_id.clone(),
                role,
            ));
        }

        debug!(
            room = %slot.room_id,
            %date,
            session = %slot.session,
            supervisor = ?selection.pair.supervisor,
            assistant = ?selection.pair.assistant,
            pairing = ?selection.kind,
            "slot planned"
        );

        state
            .history
            .record(&slot.history_key, selection.pair.clone());
        outcome.previews.push(SlotPreview::resolved(
            slot,
            linkage,
            &selection.pair,
            selection.kind,
        ));
    }

    outcome
}

/// Runs a calculation with fresh bookkeeping.
pub fn plan_slots<R>(
    slots: &[CoverageSlot],
    limits: &RankLimits,
    snapshot: &mut ContextSnapshot,
    resolver: &R,
) -> CalculationOutcome
where
    R: SlotResolver + ?Sized,
{
    let mut state = CalculationState::for_slots(slots);
    calculate_assignments(slots, limits, snapshot, resolver, &mut state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::models::{ExamWindow, LinkageId, PairingKind, Rank, Session, Teacher};
    use std::collections::HashMap;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn slot(room: &str, date: NaiveDate) -> CoverageSlot {
        CoverageSlot::new(
            room,
            date,
            Session::Morning,
            ExamWindow::from_hm((9, 0), (11, 0)).unwrap(),
        )
    }

    fn limits() -> RankLimits {
        RankLimits::empty()
            .with_limit(Rank::Senior, 5)
            .with_limit(Rank::Lecturer, 7)
    }

    fn rooms(slots: &[CoverageSlot]) -> InMemoryGateway {
        slots.iter().fold(InMemoryGateway::new(), |g, s| {
            let linkage = format!("{}@{}", s.room_id, s.date);
            g.with_room(s.room_id.clone(), s.date, linkage)
        })
    }

    /// Teachers of both pools; seniors sit in both, as a store may list them.
    fn snapshot(teachers: &[Teacher]) -> ContextSnapshot {
        let seniors: Vec<Teacher> = teachers
            .iter()
            .filter(|t| t.rank == Rank::Senior)
            .cloned()
            .collect();
        ContextSnapshot::new(seniors, teachers.to_vec())
    }

    #[test]
    fn test_single_slot_pairs_senior_with_lecturer() {
        let slots = vec![slot("R1", d(1))];
        let mut snap = snapshot(&[
            Teacher::senior("S0").with_periods(0),
            Teacher::senior("S2").with_periods(2),
            Teacher::lecturer("L1"),
        ]);
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&slots));

        let p = &out.previews[0];
        assert!(p.ok);
        assert_eq!(p.supervisor.as_deref(), Some("S0"));
        assert_eq!(p.assistant.as_deref(), Some("L1"));
        assert_eq!(snap.periods("S0"), Some(1));
        assert_eq!(snap.periods("L1"), Some(1));
        assert_eq!(snap.periods("S2"), Some(2));
        assert_eq!(out.assignments.len(), 2);
        assert_eq!(out.assignments[0].role, Role::Supervisor);
        assert_eq!(out.assignments[1].role, Role::Assistant);
    }

    #[test]
    fn test_scarce_fallback_then_quota_exhausted() {
        let slots = vec![slot("R1", d(1)), slot("R2", d(1)), slot("R3", d(1))];
        let mut snap = snapshot(&[
            Teacher::senior("S0").with_periods(0),
            Teacher::senior("S2").with_periods(2),
            Teacher::senior("S3").with_periods(1),
            Teacher::senior("S4").with_periods(1),
            Teacher::senior("S5").with_periods(1),
            Teacher::lecturer("L1"),
        ]);
        let mut state = CalculationState::for_slots(&slots);
        let out = calculate_assignments(&slots, &limits(), &mut snap, &rooms(&slots), &mut state);

        // Slot 1: S0 + L1.
        assert_eq!(out.previews[0].pairing, PairingKind::Normal(Rank::Lecturer));
        // Slot 2: no ordinary assistant left; senior + senior.
        let second = &out.previews[1];
        assert_eq!(second.pairing, PairingKind::Scarce);
        assert_eq!(second.supervisor.as_deref(), Some("S3"));
        assert_eq!(second.assistant.as_deref(), Some("S4"));
        assert_eq!(state.quota.uses_in(0), 1);
        // Slot 3: quota spent; supervisor only.
        let third = &out.previews[2];
        assert!(third.ok);
        assert_eq!(third.supervisor.as_deref(), Some("S5"));
        assert_eq!(third.assistant, None);
        assert_eq!(third.pairing, PairingKind::SupervisorOnly);
    }

    #[test]
    fn test_unresolved_slot_is_isolated() {
        let resolvable = vec![slot("R1", d(1)), slot("R3", d(1))];
        let slots = vec![slot("R1", d(1)), slot("GHOST", d(1)), slot("R3", d(1))];
        let mut snap = snapshot(&[
            Teacher::senior("S1"),
            Teacher::senior("S2"),
            Teacher::lecturer("L1"),
            Teacher::lecturer("L2"),
        ]);
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&resolvable));

        assert_eq!(out.previews.len(), 3);
        assert!(out.previews[0].ok);
        assert!(!out.previews[1].ok);
        assert_eq!(
            out.previews[1].message.as_deref(),
            Some("Room not found for this date")
        );
        assert!(out.previews[2].ok);
        assert!(out
            .assignments
            .iter()
            .all(|a| a.linkage != LinkageId::new("GHOST@2025-06-01")));
        assert_eq!(out.assignments.len(), 4);
    }

    #[test]
    fn test_no_teachers_message() {
        let slots = vec![slot("R1", d(1))];
        let mut snap = snapshot(&[Teacher::lecturer("L1")]);
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&slots));
        assert!(!out.previews[0].ok);
        assert_eq!(out.previews[0].message.as_deref(), Some("No available teachers"));
        assert!(out.assignments.is_empty());
        assert_eq!(out.ok_count(), 0);
    }

    #[test]
    fn test_busy_teachers_respected() {
        let slots = vec![slot("R1", d(1))];
        let mut snap = snapshot(&[
            Teacher::senior("S1"),
            Teacher::senior("S2").with_periods(3),
            Teacher::lecturer("L1"),
        ])
        .with_busy(d(1), "S1");
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&slots));
        assert_eq!(out.previews[0].supervisor.as_deref(), Some("S2"));
    }

    #[test]
    fn test_teacher_reused_on_next_date() {
        let slots = vec![slot("R1", d(1)), slot("R1", d(2))];
        let mut snap = snapshot(&[Teacher::senior("S1"), Teacher::lecturer("L1")]);
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&slots));
        assert!(out.previews.iter().all(|p| p.supervisor.as_deref() == Some("S1")));
        assert_eq!(snap.periods("S1"), Some(2));
    }

    #[test]
    fn test_cap_stops_assignment() {
        let slots: Vec<_> = (1..=4).map(|day| slot("R1", d(day))).collect();
        let tight = RankLimits::empty().with_limit(Rank::Senior, 2);
        let mut snap = snapshot(&[Teacher::senior("S1")]);
        let out = plan_slots(&slots, &tight, &mut snap, &rooms(&slots));
        let filled = out.previews.iter().filter(|p| p.ok).count();
        assert_eq!(filled, 2);
        assert_eq!(snap.periods("S1"), Some(2));
    }

    #[test]
    fn test_history_rotates_pairs_across_dates() {
        // Same room on two dates; second date should avoid repeating S1 as supervisor.
        let slots = vec![slot("R1", d(1)), slot("R1", d(2))];
        let mut snap = snapshot(&[
            Teacher::senior("S1"),
            Teacher::senior("S2").with_periods(3),
            Teacher::lecturer("L1"),
        ]);
        let out = plan_slots(&slots, &limits(), &mut snap, &rooms(&slots));
        assert_eq!(out.previews[0].supervisor.as_deref(), Some("S1"));
        assert_eq!(out.previews[1].supervisor.as_deref(), Some("S2"));
    }

    #[test]
    fn test_no_double_booking_and_role_exclusivity() {
        let dates = [d(1), d(2), d(3)];
        let slots: Vec<_> = dates
            .iter()
            .flat_map(|&date| (1..=4).map(move |r| slot(&format!("R{r}"), date)))
            .collect();
        let mut teachers = Vec::new();
        for i in 0..5 {
            teachers.push(Teacher::senior(format!("S{i}")));
        }
        for i in 0..3 {
            teachers.push(Teacher::lecturer(format!("L{i}")));
            teachers.push(Teacher::new(format!("T{i}"), Rank::Tutor));
        }
        let mut snap = snapshot(&teachers);
        let out = plan_slots(&slots, &RankLimits::default(), &mut snap, &rooms(&slots));

        let mut seen: HashMap<NaiveDate, HashSet<String>> = HashMap::new();
        for a in &out.assignments {
            assert!(
                seen.entry(a.date).or_default().insert(a.teacher_id.clone()),
                "{} booked twice on {}",
                a.teacher_id,
                a.date
            );
        }
        for p in &out.previews {
            if let (Some(s), Some(a)) = (&p.supervisor, &p.assistant) {
                assert_ne!(s, a);
            }
        }
        for t in snap.teachers() {
            let cap = RankLimits::default().limit_for(t.rank).unwrap();
            assert!(t.periods <= cap);
        }
    }

    #[test]
    fn test_scarce_quota_per_two_date_window() {
        // Only seniors: every slot wants a scarce pairing.
        let dates = [d(1), d(2), d(3), d(4), d(5)];
        let slots: Vec<_> = dates
            .iter()
            .flat_map(|&date| [slot("R1", date), slot("R2", date)])
            .collect();
        let teachers: Vec<_> = (0..8).map(|i| Teacher::senior(format!("S{i}"))).collect();
        let mut snap = snapshot(&teachers);
        let mut state = CalculationState::for_slots(&slots);
        let out = calculate_assignments(
            &slots,
            &RankLimits::empty(),
            &mut snap,
            &rooms(&slots),
            &mut state,
        );

        let mut per_window: HashMap<usize, usize> = HashMap::new();
        for p in out.previews.iter().filter(|p| p.pairing.is_scarce()) {
            let w = state.quota.window_for(p.date).unwrap();
            *per_window.entry(w).or_insert(0) += 1;
        }
        assert_eq!(per_window.len(), 3);
        assert!(per_window.values().all(|&n| n == 1));
    }

    #[test]
    fn test_deterministic_across_fresh_runs() {
        let slots: Vec<_> = [d(3), d(1), d(2)]
            .iter()
            .flat_map(|&date| [slot("A", date), slot("B", date), slot("C", date)])
            .collect();
        let teachers = vec![
            Teacher::senior("S1").with_periods(1),
            Teacher::senior("S2"),
            Teacher::senior("S3").with_periods(2),
            Teacher::senior("S4"),
            Teacher::lecturer("L1"),
            Teacher::new("AL1", Rank::AssistantLecturer),
            Teacher::new("T1", Rank::Tutor).with_periods(1),
        ];
        let gateway = rooms(&slots);

        let mut first_snap = snapshot(&teachers);
        let first = plan_slots(&slots, &RankLimits::default(), &mut first_snap, &gateway);
        let mut second_snap = snapshot(&teachers);
        let second = plan_slots(&slots, &RankLimits::default(), &mut second_snap, &gateway);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.assignments).unwrap(),
            serde_json::to_string(&second.assignments).unwrap()
        );
    }
}
