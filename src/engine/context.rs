//! Run-scoped context snapshot.
//!
//! Holds every prefetched teacher once, in an arena indexed by teacher id.
//! The supervisor and assistant pools are index lists into that arena, so a
//! teacher listed in both pools shares one running period count and a
//! workload update is a single O(1) write.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::eligibility::is_eligible;
use crate::config::RankLimits;
use crate::gateway::PrefetchedContext;
use crate::models::Teacher;

/// In-memory, exclusively owned copy of the teacher pools for one run.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    teachers: Vec<Teacher>,
    index: HashMap<String, usize>,
    supervisor_pool: Vec<usize>,
    assistant_pool: Vec<usize>,
    busy_by_date: BTreeMap<NaiveDate, HashSet<String>>,
}

impl ContextSnapshot {
    /// Builds a snapshot from the two prefetched pools.
    ///
    /// Pool order is preserved; it is the final tie-break during selection.
    /// A teacher listed twice keeps the first record seen.
    pub fn new(
        supervisors: impl IntoIterator<Item = Teacher>,
        assistants: impl IntoIterator<Item = Teacher>,
    ) -> Self {
        let mut snapshot = Self::default();
        for teacher in supervisors {
            let idx = snapshot.intern(teacher);
            if !snapshot.supervisor_pool.contains(&idx) {
                snapshot.supervisor_pool.push(idx);
            }
        }
        for teacher in assistants {
            let idx = snapshot.intern(teacher);
            if !snapshot.assistant_pool.contains(&idx) {
                snapshot.assistant_pool.push(idx);
            }
        }
        snapshot
    }

    /// Builds a snapshot from a gateway prefetch.
    pub fn from_prefetch(context: PrefetchedContext) -> Self {
        let mut snapshot = Self::new(context.supervisor_pool, context.assistant_pool);
        for (date, ids) in context.busy_by_date {
            snapshot
                .busy_by_date
                .entry(date)
                .or_default()
                .extend(ids);
        }
        snapshot
    }

    /// Marks a teacher as already busy on a date (builder form).
    pub fn with_busy(mut self, date: NaiveDate, teacher_id: impl Into<String>) -> Self {
        self.busy_by_date
            .entry(date)
            .or_default()
            .insert(teacher_id.into());
        self
    }

    fn intern(&mut self, teacher: Teacher) -> usize {
        if let Some(&idx) = self.index.get(&teacher.id) {
            return idx;
        }
        let idx = self.teachers.len();
        self.index.insert(teacher.id.clone(), idx);
        self.teachers.push(teacher);
        idx
    }

    /// Looks a teacher up by id.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.index.get(id).map(|&idx| &self.teachers[idx])
    }

    /// Running period count for a teacher.
    pub fn periods(&self, id: &str) -> Option<u32> {
        self.teacher(id).map(|t| t.periods)
    }

    /// All distinct teachers, in first-seen order.
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// Supervisor pool, in prefetch order.
    pub fn supervisor_pool(&self) -> impl Iterator<Item = &Teacher> + '_ {
        self.supervisor_pool.iter().map(|&idx| &self.teachers[idx])
    }

    /// Assistant pool, in prefetch order.
    pub fn assistant_pool(&self) -> impl Iterator<Item = &Teacher> + '_ {
        self.assistant_pool.iter().map(|&idx| &self.teachers[idx])
    }

    /// Teachers busy on a date from previously committed assignments.
    pub fn busy_on(&self, date: NaiveDate) -> HashSet<String> {
        self.busy_by_date.get(&date).cloned().unwrap_or_default()
    }

    /// Eligible supervisor and assistant candidates for a date, in pool order.
    pub fn candidates(
        &self,
        date: NaiveDate,
        limits: &RankLimits,
        used_today: &HashSet<String>,
    ) -> (Vec<&Teacher>, Vec<&Teacher>) {
        let keep = |t: &&Teacher| is_eligible(t, limits, used_today, date);
        (
            self.supervisor_pool().filter(keep).collect(),
            self.assistant_pool().filter(keep).collect(),
        )
    }

    /// Adds one period to a teacher's running total.
    ///
    /// Returns the new total, or `None` for an unknown id.
    pub fn record_period(&mut self, id: &str) -> Option<u32> {
        let idx = *self.index.get(id)?;
        let teacher = &mut self.teachers[idx];
        teacher.periods += 1;
        Some(teacher.periods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rank;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_shared_teacher_updates_once() {
        let shared = Teacher::senior("S1").with_periods(2);
        let mut snap = ContextSnapshot::new(
            vec![shared.clone()],
            vec![shared, Teacher::lecturer("L1")],
        );

        assert_eq!(snap.teachers().len(), 2);
        assert_eq!(snap.record_period("S1"), Some(3));

        let in_sup = snap.supervisor_pool().next().unwrap();
        let in_asst = snap.assistant_pool().next().unwrap();
        assert_eq!(in_sup.periods, 3);
        assert_eq!(in_asst.periods, 3);
    }

    #[test]
    fn test_record_period_unknown() {
        let mut snap = ContextSnapshot::default();
        assert_eq!(snap.record_period("ghost"), None);
    }

    #[test]
    fn test_pool_order_preserved() {
        let snap = ContextSnapshot::new(
            vec![Teacher::senior("S2"), Teacher::senior("S1")],
            vec![],
        );
        let ids: Vec<_> = snap.supervisor_pool().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["S2", "S1"]);
    }

    #[test]
    fn test_candidates_exclude_busy_and_unavailable() {
        let snap = ContextSnapshot::new(
            vec![
                Teacher::senior("S1"),
                Teacher::senior("S2").unavailable_on(d(1)),
            ],
            vec![Teacher::lecturer("L1"), Teacher::new("T1", Rank::Tutor)],
        )
        .with_busy(d(1), "L1");

        let used = snap.busy_on(d(1));
        let (sups, assts) = snap.candidates(d(1), &RankLimits::empty(), &used);
        assert_eq!(sups.len(), 1);
        assert_eq!(sups[0].id, "S1");
        assert_eq!(assts.len(), 1);
        assert_eq!(assts[0].id, "T1");

        assert!(snap.busy_on(d(2)).is_empty());
    }
}
