//! Run orchestration: prefetch, calculate, preview, commit, report.
//!
//! # State machine
//!
//! ```text
//!  Idle ──begin_calculation──▶ Calculating ──▶ Preview ──confirm_and_save──▶ Saving ──▶ Done
//!   ▲                              │              │                                      │
//!   └───────────cancel─────────────┼──────────────┘                                      │
//!                                  └── prefetch / validation failure ──▶ Done ◀─retry_save┘
//! ```
//!
//! `Calculating` and `Saving` are entered and left within a single call.
//! A prefetch failure writes nothing. A commit failure keeps the plan so it
//! can be re-submitted with [`RunOrchestrator::retry_save`]. A finished run
//! may be restarted from scratch with another `begin_calculation`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::mem;
use tracing::{info, warn};

use crate::config::RankLimits;
use crate::engine::{plan_slots, CalculationOutcome, ContextSnapshot};
use crate::gateway::PersistenceGateway;
use crate::models::{CoverageSlot, PlannedAssignment, Session, SlotPreview};
use crate::report::WorkloadKpi;
use crate::validation::validate_context;

/// Externally visible run phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Calculating,
    Preview,
    Saving,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunPhase::Idle => "idle",
            RunPhase::Calculating => "calculating",
            RunPhase::Preview => "in preview",
            RunPhase::Saving => "saving",
            RunPhase::Done => "done",
        };
        f.write_str(label)
    }
}

/// Result of a transition: the phase reached and a message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub phase: RunPhase,
    pub message: Option<String>,
}

impl Transition {
    fn to(phase: RunPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: Some(message.into()),
        }
    }
}

/// Illegal use of the state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("cannot {action} while the run is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: RunPhase,
    },
}

/// Save outcome for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotResult {
    pub room_id: String,
    pub date: NaiveDate,
    pub session: Session,
    pub saved: bool,
    /// Why the slot was not saved.
    pub message: Option<String>,
}

impl SlotResult {
    fn after_commit(preview: &SlotPreview) -> Self {
        let saved = preview.linkage.is_some() && preview.ok;
        Self {
            room_id: preview.room_id.clone(),
            date: preview.date,
            session: preview.session,
            saved,
            message: if saved { None } else { preview.message.clone() },
        }
    }

    fn after_failed_commit(preview: &SlotPreview, error: &str) -> Self {
        Self {
            room_id: preview.room_id.clone(),
            date: preview.date,
            session: preview.session,
            saved: false,
            message: Some(preview.message.clone().unwrap_or_else(|| error.to_string())),
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Previews as computed (empty if the run aborted before calculating).
    pub previews: Vec<SlotPreview>,
    /// Per-slot save outcome (empty if the run aborted before saving).
    pub results: Vec<SlotResult>,
    /// Run-level failure, if any.
    pub error: Option<String>,
}

impl RunReport {
    fn aborted(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Rooms in the batch.
    pub fn total_rooms(&self) -> usize {
        self.previews.len()
    }

    /// Rooms whose duties were saved.
    pub fn saved_rooms(&self) -> usize {
        self.results.iter().filter(|r| r.saved).count()
    }

    /// Whether the run finished without a run-level failure.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
struct Plan {
    outcome: CalculationOutcome,
    kpi: WorkloadKpi,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Calculating,
    Preview(Plan),
    Saving,
    Done {
        report: RunReport,
        /// Plan kept after a failed commit.
        retained: Option<Plan>,
    },
}

impl State {
    fn phase(&self) -> RunPhase {
        match self {
            State::Idle => RunPhase::Idle,
            State::Calculating => RunPhase::Calculating,
            State::Preview(_) => RunPhase::Preview,
            State::Saving => RunPhase::Saving,
            State::Done { .. } => RunPhase::Done,
        }
    }
}

/// Drives one operator's invigilation run.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_invigilate::config::RankLimits;
/// use u_invigilate::gateway::InMemoryGateway;
/// use u_invigilate::models::{CoverageSlot, ExamWindow, Session, Teacher};
/// use u_invigilate::orchestrator::{RunOrchestrator, RunPhase};
///
/// let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// let window = ExamWindow::from_hm((9, 0), (11, 0)).unwrap();
/// let mut gateway = InMemoryGateway::new()
///     .with_room("H-101", date, "link-1")
///     .with_teachers([Teacher::senior("S1"), Teacher::lecturer("L1")]);
/// let slots = vec![CoverageSlot::new("H-101", date, Session::Morning, window)];
///
/// let mut run = RunOrchestrator::new(RankLimits::default());
/// assert_eq!(run.begin_calculation(&gateway, &slots).unwrap().phase, RunPhase::Preview);
/// assert_eq!(run.planned().len(), 2);
///
/// let done = run.confirm_and_save(&mut gateway).unwrap();
/// assert_eq!(done.phase, RunPhase::Done);
/// assert_eq!(run.report().unwrap().saved_rooms(), 1);
/// assert_eq!(gateway.committed().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RunOrchestrator {
    limits: RankLimits,
    state: State,
}

impl RunOrchestrator {
    /// Creates an idle orchestrator with the operator's rank limits.
    pub fn new(limits: RankLimits) -> Self {
        Self {
            limits,
            state: State::Idle,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    /// Rank limits used for the next calculation.
    pub fn limits(&self) -> &RankLimits {
        &self.limits
    }

    /// Edits the rank limits for the next calculation.
    pub fn limits_mut(&mut self) -> &mut RankLimits {
        &mut self.limits
    }

    /// Previews of the current plan, or of the finished run.
    pub fn previews(&self) -> &[SlotPreview] {
        match &self.state {
            State::Preview(plan) => &plan.outcome.previews,
            State::Done { report, .. } => &report.previews,
            _ => &[],
        }
    }

    /// Planned rows awaiting commit (in preview, or retained after a failed commit).
    pub fn planned(&self) -> &[PlannedAssignment] {
        match &self.state {
            State::Preview(plan)
            | State::Done {
                retained: Some(plan),
                ..
            } => &plan.outcome.assignments,
            _ => &[],
        }
    }

    /// KPIs of the plan under preview or retained after a failed commit.
    pub fn kpi(&self) -> Option<&WorkloadKpi> {
        match &self.state {
            State::Preview(plan)
            | State::Done {
                retained: Some(plan),
                ..
            } => Some(&plan.kpi),
            _ => None,
        }
    }

    /// Final report once the run is done.
    pub fn report(&self) -> Option<&RunReport> {
        match &self.state {
            State::Done { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Prefetches the context for the slots' dates and computes a plan.
    ///
    /// Allowed when idle or done. Ends in `Preview`, or in `Done` carrying
    /// the error when prefetch or validation fails.
    pub fn begin_calculation<G>(
        &mut self,
        gateway: &G,
        slots: &[CoverageSlot],
    ) -> Result<Transition, OrchestratorError>
    where
        G: PersistenceGateway + ?Sized,
    {
        match self.phase() {
            RunPhase::Idle | RunPhase::Done => {}
            phase => {
                return Err(OrchestratorError::InvalidTransition {
                    action: "start a calculation",
                    phase,
                })
            }
        }

        self.state = State::Calculating;
        let dates: BTreeSet<NaiveDate> = slots.iter().map(|s| s.date).collect();
        info!(slots = slots.len(), dates = dates.len(), "calculating invigilation plan");

        let context = match gateway.prefetch_context(&dates) {
            Ok(context) => context,
            Err(e) => return Ok(self.abort(e.to_string())),
        };
        if let Err(errors) = validate_context(&context, &self.limits) {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Ok(self.abort(message));
        }

        let mut snapshot = ContextSnapshot::from_prefetch(context);
        let outcome = plan_slots(slots, &self.limits, &mut snapshot, gateway);
        let kpi = WorkloadKpi::calculate(&outcome.previews, &snapshot);

        let message = format!(
            "{} of {} rooms covered, {} duties planned",
            outcome.ok_count(),
            outcome.previews.len(),
            outcome.assignments.len()
        );
        info!(
            covered = outcome.ok_count(),
            rooms = outcome.previews.len(),
            duties = outcome.assignments.len(),
            scarce = kpi.scarce_pairings,
            "plan ready for preview"
        );
        self.state = State::Preview(Plan { outcome, kpi });
        Ok(Transition::to(RunPhase::Preview, message))
    }

    /// Discards the plan under preview. Nothing was written.
    pub fn cancel(&mut self) -> Result<Transition, OrchestratorError> {
        match self.phase() {
            RunPhase::Preview => {
                self.state = State::Idle;
                info!("plan discarded");
                Ok(Transition::to(RunPhase::Idle, "Assignment cancelled"))
            }
            phase => Err(OrchestratorError::InvalidTransition {
                action: "cancel",
                phase,
            }),
        }
    }

    /// Commits the plan under preview as one batch.
    pub fn confirm_and_save<G>(&mut self, gateway: &mut G) -> Result<Transition, OrchestratorError>
    where
        G: PersistenceGateway + ?Sized,
    {
        match mem::replace(&mut self.state, State::Saving) {
            State::Preview(plan) => Ok(self.save(gateway, plan)),
            other => Err(self.reject(other, "confirm and save")),
        }
    }

    /// Re-submits a plan whose commit failed, without recomputing it.
    pub fn retry_save<G>(&mut self, gateway: &mut G) -> Result<Transition, OrchestratorError>
    where
        G: PersistenceGateway + ?Sized,
    {
        match mem::replace(&mut self.state, State::Saving) {
            State::Done {
                retained: Some(plan),
                ..
            } => Ok(self.save(gateway, plan)),
            other => Err(self.reject(other, "retry saving")),
        }
    }

    fn reject(&mut self, previous: State, action: &'static str) -> OrchestratorError {
        let phase = previous.phase();
        self.state = previous;
        OrchestratorError::InvalidTransition { action, phase }
    }

    fn abort(&mut self, error: String) -> Transition {
        warn!(%error, "invigilation run aborted");
        self.state = State::Done {
            report: RunReport::aborted(error.clone()),
            retained: None,
        };
        Transition::to(RunPhase::Done, error)
    }

    fn save<G>(&mut self, gateway: &mut G, plan: Plan) -> Transition
    where
        G: PersistenceGateway + ?Sized,
    {
        let rows = &plan.outcome.assignments;
        info!(rows = rows.len(), "committing invigilation plan");

        let commit = if rows.is_empty() {
            Ok(())
        } else {
            gateway.batch_commit(rows)
        };

        match commit {
            Ok(()) => {
                let results = plan
                    .outcome
                    .previews
                    .iter()
                    .map(SlotResult::after_commit)
                    .collect();
                let report = RunReport {
                    previews: plan.outcome.previews,
                    results,
                    error: None,
                };
                let message = format!(
                    "Saved {} of {} rooms",
                    report.saved_rooms(),
                    report.total_rooms()
                );
                info!(saved = report.saved_rooms(), rooms = report.total_rooms(), "plan committed");
                self.state = State::Done {
                    report,
                    retained: None,
                };
                Transition::to(RunPhase::Done, message)
            }
            Err(e) => {
                let error = e.to_string();
                warn!(%error, "commit failed; no slot saved");
                let results = plan
                    .outcome
                    .previews
                    .iter()
                    .map(|p| SlotResult::after_failed_commit(p, &error))
                    .collect();
                let report = RunReport {
                    previews: plan.outcome.previews.clone(),
                    results,
                    error: Some(error.clone()),
                };
                self.state = State::Done {
                    report,
                    retained: Some(plan),
                };
                Transition::to(RunPhase::Done, format!("Saving failed: {error}"))
            }
        }
    }
}
