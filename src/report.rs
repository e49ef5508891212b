//! Plan quality metrics (KPIs).
//!
//! Computed from a calculation's previews and the post-run snapshot, and
//! shown to the operator alongside the preview.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Fully covered | Slots with supervisor and assistant |
//! | Supervisor only | Slots with a supervisor but no assistant |
//! | Failed | Unresolved or uncovered slots |
//! | Scarce pairings | Senior + senior pairs used |
//! | Coverage rate | Fully covered / resolved slots |
//! | Workload spread | Max minus min periods across the snapshot |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::ContextSnapshot;
use crate::models::{PairingKind, SlotPreview};

/// Plan performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadKpi {
    /// Slots in the batch.
    pub total_slots: usize,
    /// Slots with both roles filled.
    pub fully_covered: usize,
    /// Slots with a supervisor only.
    pub supervisor_only: usize,
    /// Slots whose room/date did not resolve.
    pub unresolved: usize,
    /// Resolved slots with no teacher at all.
    pub uncovered: usize,
    /// Senior + senior pairings used.
    pub scarce_pairings: usize,
    /// Fully covered / resolved slots (0.0..1.0). 1.0 when nothing resolved.
    pub coverage_rate: f64,
    /// Running period count per teacher after the run.
    pub periods_by_teacher: BTreeMap<String, u32>,
    /// Lowest period count.
    pub min_periods: u32,
    /// Highest period count.
    pub max_periods: u32,
}

impl WorkloadKpi {
    /// Computes KPIs from previews and the snapshot they were planned on.
    pub fn calculate(previews: &[SlotPreview], snapshot: &ContextSnapshot) -> Self {
        let mut kpi = Self {
            total_slots: previews.len(),
            fully_covered: 0,
            supervisor_only: 0,
            unresolved: 0,
            uncovered: 0,
            scarce_pairings: 0,
            coverage_rate: 1.0,
            periods_by_teacher: BTreeMap::new(),
            min_periods: 0,
            max_periods: 0,
        };

        for p in previews {
            match p.pairing {
                PairingKind::Unresolved => kpi.unresolved += 1,
                PairingKind::Uncovered => kpi.uncovered += 1,
                PairingKind::SupervisorOnly => kpi.supervisor_only += 1,
                PairingKind::Scarce => {
                    kpi.scarce_pairings += 1;
                    kpi.fully_covered += 1;
                }
                PairingKind::Normal(_) | PairingKind::AnyRank(_) => kpi.fully_covered += 1,
            }
        }

        let resolved = kpi.total_slots - kpi.unresolved;
        if resolved > 0 {
            kpi.coverage_rate = kpi.fully_covered as f64 / resolved as f64;
        }

        kpi.periods_by_teacher = snapshot
            .teachers()
            .iter()
            .map(|t| (t.id.clone(), t.periods))
            .collect();
        kpi.min_periods = kpi.periods_by_teacher.values().copied().min().unwrap_or(0);
        kpi.max_periods = kpi.periods_by_teacher.values().copied().max().unwrap_or(0);

        kpi
    }

    /// Max minus min periods.
    pub fn workload_spread(&self) -> u32 {
        self.max_periods - self.min_periods
    }

    /// Whether the plan meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, max_spread: u32) -> bool {
        self.coverage_rate >= min_coverage && self.workload_spread() <= max_spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CoverageSlot, ExamWindow, LinkageId, PairRecord, Rank, Session, Teacher,
    };
    use chrono::NaiveDate;

    fn slot() -> CoverageSlot {
        CoverageSlot::new(
            "R1",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Session::Morning,
            ExamWindow::from_hm((9, 0), (11, 0)).unwrap(),
        )
    }

    fn preview(s: Option<&str>, a: Option<&str>, kind: PairingKind) -> SlotPreview {
        let pair = PairRecord {
            supervisor: s.map(Into::into),
            assistant: a.map(Into::into),
        };
        SlotPreview::resolved(&slot(), LinkageId::new("L"), &pair, kind)
    }

    #[test]
    fn test_counts_and_rate() {
        let previews = vec![
            preview(Some("S1"), Some("L1"), PairingKind::Normal(Rank::Lecturer)),
            preview(Some("S2"), Some("S3"), PairingKind::Scarce),
            preview(Some("S4"), None, PairingKind::SupervisorOnly),
            preview(None, None, PairingKind::Uncovered),
            SlotPreview::unresolved(&slot()),
        ];
        let snap = ContextSnapshot::new(
            vec![Teacher::senior("S1").with_periods(3)],
            vec![Teacher::lecturer("L1").with_periods(1)],
        );
        let kpi = WorkloadKpi::calculate(&previews, &snap);

        assert_eq!(kpi.total_slots, 5);
        assert_eq!(kpi.fully_covered, 2);
        assert_eq!(kpi.supervisor_only, 1);
        assert_eq!(kpi.uncovered, 1);
        assert_eq!(kpi.unresolved, 1);
        assert_eq!(kpi.scarce_pairings, 1);
        assert!((kpi.coverage_rate - 0.5).abs() < 1e-10);
        assert_eq!(kpi.min_periods, 1);
        assert_eq!(kpi.max_periods, 3);
        assert_eq!(kpi.workload_spread(), 2);
        assert!(kpi.meets_thresholds(0.5, 2));
        assert!(!kpi.meets_thresholds(0.6, 2));
    }

    #[test]
    fn test_empty_run() {
        let kpi = WorkloadKpi::calculate(&[], &ContextSnapshot::default());
        assert_eq!(kpi.total_slots, 0);
        assert!((kpi.coverage_rate - 1.0).abs() < 1e-10);
        assert_eq!(kpi.workload_spread(), 0);
    }
}
