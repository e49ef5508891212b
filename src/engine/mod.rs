//! Invigilator coverage-assignment engine.
//!
//! A greedy, rule-ordered heuristic. It does not search for a global
//! optimum; it is deterministic for a given snapshot and slot order, and
//! every slot outcome carries the [`PairingKind`](crate::models::PairingKind)
//! that explains it.
//!
//! # Components
//!
//! - [`ContextSnapshot`]: run-scoped teacher arena with supervisor and
//!   assistant pool views and per-date busy sets
//! - [`is_eligible`]: availability, same-day reuse and rank cap
//! - [`pick_paired_teachers`]: pair selection for one slot
//! - [`PairHistory`], [`PairTypeUsage`], [`QuotaTracker`]: rotation and
//!   scarce-pairing bookkeeping
//! - [`calculate_assignments`]: the per-slot loop over a batch
//!
//! # Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use u_invigilate::config::RankLimits;
//! use u_invigilate::engine::{plan_slots, ContextSnapshot};
//! use u_invigilate::gateway::InMemoryGateway;
//! use u_invigilate::models::{CoverageSlot, ExamWindow, Session, Teacher};
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
//! let window = ExamWindow::from_hm((9, 0), (11, 0)).unwrap();
//! let slots = vec![CoverageSlot::new("H-101", date, Session::Morning, window)];
//! let rooms = InMemoryGateway::new().with_room("H-101", date, "link-1");
//! let mut snapshot = ContextSnapshot::new(
//!     vec![Teacher::senior("S1")],
//!     vec![Teacher::lecturer("L1")],
//! );
//!
//! let outcome = plan_slots(&slots, &RankLimits::default(), &mut snapshot, &rooms);
//! assert!(outcome.previews[0].ok);
//! assert_eq!(outcome.assignments.len(), 2);
//! ```

mod calculate;
mod context;
mod eligibility;
mod history;
mod pairing;
mod quota;
mod usage;

pub use calculate::{calculate_assignments, plan_slots, CalculationOutcome, CalculationState};
pub use context::ContextSnapshot;
pub use eligibility::is_eligible;
pub use history::{has_paired, has_supervised, PairHistory};
pub use pairing::{pick_paired_teachers, PairSelection, SlotContext};
pub use quota::{QuotaTracker, DATES_PER_WINDOW, MAX_SCARCE_PER_WINDOW};
pub use usage::{PairType, PairTypeUsage};
