//! Supervisor/assistant selection for a single coverage slot.
//!
//! # Algorithm
//!
//! 1. Eligible supervisor-rank teachers form the supervisor pool. If it is
//!    empty the slot is uncovered.
//! 2. Eligible teachers of any other rank form the normal assistant pool.
//!    The supervisor rank is kept out; it is reserved for the scarce path.
//! 3. The supervisor is the lowest-workload teacher among those who never
//!    supervised this history key, or among all candidates if none are fresh.
//! 4. Viable pair types are the normal types (preference order) that still
//!    have a candidate assistant.
//! 5. The least-used viable type today is taken and counted. Its assistant
//!    is a fresh partner for this supervisor if possible, else the
//!    lowest-workload teacher of that rank. If that rank ran dry, the
//!    lowest-workload assistant of any normal rank is taken.
//! 6. Otherwise, and only if the quota allows, a second supervisor-rank
//!    teacher becomes the assistant (scarce pairing). Failing that the
//!    slot gets a supervisor only.
//!
//! Workload ties go to the earliest teacher in pool order.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::eligibility::is_eligible;
use super::history::{has_paired, has_supervised};
use super::usage::{PairType, PairTypeUsage};
use crate::config::RankLimits;
use crate::models::{PairRecord, PairingKind, Rank, Teacher};

/// Per-slot inputs to the selector.
#[derive(Debug, Clone, Copy)]
pub struct SlotContext<'a> {
    /// Exam date of the slot.
    pub date: NaiveDate,
    /// Per-rank caps.
    pub limits: &'a RankLimits,
    /// Teachers already placed on this date.
    pub used_today: &'a HashSet<String>,
    /// Past pairs for the slot's history key.
    pub history: &'a [PairRecord],
    /// Whether the slot's quota window still allows a scarce pairing.
    pub scarce_allowed: bool,
}

/// Outcome of selection for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSelection {
    pub pair: PairRecord,
    pub kind: PairingKind,
}

impl PairSelection {
    fn uncovered() -> Self {
        Self {
            pair: PairRecord::default(),
            kind: PairingKind::Uncovered,
        }
    }

    fn new(supervisor: &Teacher, assistant: Option<&Teacher>, kind: PairingKind) -> Self {
        Self {
            pair: PairRecord {
                supervisor: Some(supervisor.id.clone()),
                assistant: assistant.map(|t| t.id.clone()),
            },
            kind,
        }
    }
}

/// Chooses a supervisor and, if possible, an assistant for one slot.
///
/// Marks the chosen normal pair type as used in `usage`. Does not touch
/// workload counts or `used_today`; the caller applies the selection.
///
/// # Example
/// ```
/// use std::collections::HashSet;
/// use chrono::NaiveDate;
/// use u_invigilate::config::RankLimits;
/// use u_invigilate::engine::{pick_paired_teachers, PairTypeUsage, SlotContext};
/// use u_invigilate::models::{PairingKind, Teacher};
///
/// let s = Teacher::senior("S1");
/// let l = Teacher::lecturer("L1");
/// let limits = RankLimits::default();
/// let used = HashSet::new();
/// let ctx = SlotContext {
///     date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
///     limits: &limits,
///     used_today: &used,
///     history: &[],
///     scarce_allowed: true,
/// };
/// let mut usage = PairTypeUsage::new();
/// let pick = pick_paired_teachers(&[&s], &[&l], &ctx, &mut usage);
/// assert_eq!(pick.pair.supervisor.as_deref(), Some("S1"));
/// assert_eq!(pick.pair.assistant.as_deref(), Some("L1"));
/// assert!(matches!(pick.kind, PairingKind::Normal(_)));
/// ```
pub fn pick_paired_teachers(
    supervisors: &[&Teacher],
    assistants: &[&Teacher],
    ctx: &SlotContext<'_>,
    usage: &mut PairTypeUsage,
) -> PairSelection {
    let eligible = |t: &&Teacher| is_eligible(t, ctx.limits, ctx.used_today, ctx.date);

    let supervisor_pool: Vec<&Teacher> = supervisors
        .iter()
        .copied()
        .filter(|t| t.rank == Rank::SUPERVISOR)
        .filter(eligible)
        .collect();

    let Some(supervisor) =
        pick_fresh_first(&supervisor_pool, |t| !has_supervised(ctx.history, &t.id))
    else {
        return PairSelection::uncovered();
    };

    let assistant_pool: Vec<&Teacher> = assistants
        .iter()
        .copied()
        .filter(|t| t.rank != Rank::SUPERVISOR && t.id != supervisor.id)
        .filter(eligible)
        .collect();

    let viable: Vec<PairType> = PairType::NORMAL
        .into_iter()
        .filter(|pt| assistant_pool.iter().any(|t| t.rank == pt.assistant))
        .collect();

    if let Some(pair_type) = usage.least_used(&viable) {
        usage.mark_used(pair_type);

        let of_rank: Vec<&Teacher> = assistant_pool
            .iter()
            .copied()
            .filter(|t| t.rank == pair_type.assistant)
            .collect();
        if let Some(assistant) =
            pick_fresh_first(&of_rank, |t| !has_paired(ctx.history, &supervisor.id, &t.id))
        {
            return PairSelection::new(
                supervisor,
                Some(assistant),
                PairingKind::Normal(pair_type.assistant),
            );
        }

        if let Some(assistant) = lowest_workload(&assistant_pool) {
            return PairSelection::new(
                supervisor,
                Some(assistant),
                PairingKind::AnyRank(assistant.rank),
            );
        }
    }

    scarce_fallback(supervisor, &supervisor_pool, assistants, ctx)
}

/// Pairs two supervisor-rank teachers when the quota allows it.
fn scarce_fallback(
    supervisor: &Teacher,
    supervisor_pool: &[&Teacher],
    assistants: &[&Teacher],
    ctx: &SlotContext<'_>,
) -> PairSelection {
    if !ctx.scarce_allowed {
        return PairSelection::new(supervisor, None, PairingKind::SupervisorOnly);
    }

    // Seniors may sit in either pool; supervisor pool first, no duplicates.
    let mut seen: HashSet<&str> = HashSet::new();
    let candidates: Vec<&Teacher> = supervisor_pool
        .iter()
        .copied()
        .chain(assistants.iter().copied().filter(|t| {
            t.rank == Rank::SUPERVISOR
                && is_eligible(t, ctx.limits, ctx.used_today, ctx.date)
        }))
        .filter(|t| t.id != supervisor.id)
        .filter(|&t| seen.insert(t.id.as_str()))
        .collect();

    match pick_fresh_first(&candidates, |t| {
        !has_paired(ctx.history, &supervisor.id, &t.id)
    }) {
        Some(partner) => PairSelection::new(supervisor, Some(partner), PairingKind::Scarce),
        None => PairSelection::new(supervisor, None, PairingKind::SupervisorOnly),
    }
}

/// Lowest-workload teacher among those passing `fresh`, else among all.
fn pick_fresh_first<'t>(
    pool: &[&'t Teacher],
    fresh: impl Fn(&Teacher) -> bool,
) -> Option<&'t Teacher> {
    let preferred: Vec<&'t Teacher> = pool.iter().copied().filter(|&t| fresh(t)).collect();
    lowest_workload(&preferred).or_else(|| lowest_workload(pool))
}

/// Lowest running period count; ties keep pool order.
fn lowest_workload<'t>(pool: &[&'t Teacher]) -> Option<&'t Teacher> {
    pool.iter().copied().min_by_key(|t| t.periods)
}
