//! Persistence gateway boundary.
//!
//! The engine owns no storage. Everything persisted goes through a
//! [`PersistenceGateway`]: prefetching the teacher context for a run,
//! resolving a room/date to its linkage, and committing the plan as one
//! batch. [`InMemoryGateway`] is a complete in-process implementation used
//! for tests and embedding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{LinkageId, PlannedAssignment, Rank, Teacher};

/// Failures crossing the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("commit rejected: {0}")]
    Rejected(String),
}

/// Teacher pools and busy sets fetched for the dates of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefetchedContext {
    /// Candidate supervisors, in store order.
    pub supervisor_pool: Vec<Teacher>,
    /// Candidate assistants, in store order.
    pub assistant_pool: Vec<Teacher>,
    /// Teachers already committed on each date.
    pub busy_by_date: BTreeMap<NaiveDate, BTreeSet<String>>,
}

/// Room/date to linkage lookup.
pub trait SlotResolver {
    /// Linkage for a room on a date, or `None` if no such room is persisted.
    fn resolve_slot_linkage(&self, room_id: &str, date: NaiveDate) -> Option<LinkageId>;
}

/// Storage collaborator for invigilation runs.
pub trait PersistenceGateway: SlotResolver {
    /// Fetches teacher pools and busy sets for the given dates.
    fn prefetch_context(&self, dates: &BTreeSet<NaiveDate>)
        -> Result<PrefetchedContext, GatewayError>;

    /// Writes all rows, or none.
    fn batch_commit(&mut self, rows: &[PlannedAssignment]) -> Result<(), GatewayError>;

    /// Existing assignment rows per `room|date` key, for UI badges.
    fn existing_assignment_counts(&self) -> Result<HashMap<String, usize>, GatewayError>;
}

/// A gateway backed by in-process tables.
///
/// Teachers are stored with their baseline period counts; committed rows
/// add to those counts and populate the busy sets on later prefetches.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    rooms: HashMap<(String, NaiveDate), LinkageId>,
    linkage_keys: HashMap<LinkageId, String>,
    teachers: Vec<Teacher>,
    committed: Vec<PlannedAssignment>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a room on a date under a linkage id.
    pub fn with_room(
        mut self,
        room_id: impl Into<String>,
        date: NaiveDate,
        linkage: impl Into<String>,
    ) -> Self {
        let room_id = room_id.into();
        let linkage = LinkageId::new(linkage);
        self.linkage_keys
            .insert(linkage.clone(), format!("{room_id}|{date}"));
        self.rooms.insert((room_id, date), linkage);
        self
    }

    /// Registers a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Registers several teachers, keeping their order.
    pub fn with_teachers(mut self, teachers: impl IntoIterator<Item = Teacher>) -> Self {
        self.teachers.extend(teachers);
        self
    }

    /// Rows committed so far.
    pub fn committed(&self) -> &[PlannedAssignment] {
        &self.committed
    }

    fn committed_periods(&self, teacher_id: &str) -> u32 {
        let n = self
            .committed
            .iter()
            .filter(|row| row.teacher_id == teacher_id)
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    fn current(&self, teacher: &Teacher) -> Teacher {
        let mut t = teacher.clone();
        t.periods = t.periods.saturating_add(self.committed_periods(&t.id));
        t
    }
}

impl SlotResolver for InMemoryGateway {
    fn resolve_slot_linkage(&self, room_id: &str, date: NaiveDate) -> Option<LinkageId> {
        self.rooms.get(&(room_id.to_string(), date)).cloned()
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn prefetch_context(
        &self,
        dates: &BTreeSet<NaiveDate>,
    ) -> Result<PrefetchedContext, GatewayError> {
        let supervisor_pool = self
            .teachers
            .iter()
            .filter(|t| t.rank == Rank::SUPERVISOR)
            .map(|t| self.current(t))
            .collect();
        let assistant_pool = self
            .teachers
            .iter()
            .filter(|t| t.rank != Rank::SUPERVISOR)
            .map(|t| self.current(t))
            .collect();

        let mut busy_by_date: BTreeMap<NaiveDate, BTreeSet<String>> = BTreeMap::new();
        for row in self.committed.iter().filter(|r| dates.contains(&r.date)) {
            busy_by_date
                .entry(row.date)
                .or_default()
                .insert(row.teacher_id.clone());
        }

        Ok(PrefetchedContext {
            supervisor_pool,
            assistant_pool,
            busy_by_date,
        })
    }

    fn batch_commit(&mut self, rows: &[PlannedAssignment]) -> Result<(), GatewayError> {
        if let Some(bad) = rows
            .iter()
            .find(|row| !self.linkage_keys.contains_key(&row.linkage))
        {
            return Err(GatewayError::Rejected(format!(
                "unknown room linkage '{}'",
                bad.linkage
            )));
        }
        self.committed.extend_from_slice(rows);
        Ok(())
    }

    fn existing_assignment_counts(&self) -> Result<HashMap<String, usize>, GatewayError> {
        let mut counts = HashMap::new();
        for row in &self.committed {
            if let Some(key) = self.linkage_keys.get(&row.linkage) {
                *counts.entry(key.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
