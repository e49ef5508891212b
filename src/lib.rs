//! Exam invigilation coverage engine.
//!
//! Assigns one supervising teacher and, where possible, one assisting
//! teacher to every exam room/date/session in a batch. Assignments are
//! conflict-free (no teacher twice on one date), respect per-rank period
//! caps, rotate pairings per recurring room/group, spread workload, and
//! keep the scarce senior+senior pairing behind a two-date quota. A run is
//! previewed before anything is written.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Teacher`, `Rank`, `CoverageSlot`,
//!   `PlannedAssignment`, `SlotPreview`
//! - **`config`**: Operator options: `RankLimits`, `BatchScope`
//! - **`engine`**: Context snapshot, eligibility, pair selection, quota
//!   and history bookkeeping, batch calculation
//! - **`gateway`**: Persistence boundary trait and an in-memory implementation
//! - **`orchestrator`**: Calculate → preview → save run state machine
//! - **`validation`**: Prefetched context integrity checks
//! - **`report`**: Plan KPIs for the preview
//!
//! # Architecture
//!
//! Calculation is synchronous and single-threaded over a run-owned
//! snapshot. The only I/O is the prefetch and the batch commit, both behind
//! [`gateway::PersistenceGateway`]. Logging goes through `tracing`; the
//! crate installs no subscriber.

pub mod config;
pub mod engine;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod validation;
