//! Invigilation domain models.
//!
//! Provides the data types shared by the engine, the gateway boundary and
//! the orchestrator.
//!
//! # Domain Mappings
//!
//! | u-invigilate | Exam office term |
//! |--------------|------------------|
//! | Teacher | Invigilator / staff member |
//! | CoverageSlot | Exam room on a date and session |
//! | PairRecord | Supervisor + assistant pair on one room |
//! | PlannedAssignment | Invigilation duty row |

mod assignment;
mod slot;
mod teacher;

pub use assignment::{LinkageId, PairRecord, PairingKind, PlannedAssignment, Role, SlotPreview};
pub use slot::{CoverageSlot, ExamWindow, Session};
pub use teacher::{Rank, Teacher};
