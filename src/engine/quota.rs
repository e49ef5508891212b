//! Scarce-pairing quota.
//!
//! Exam dates are sorted, deduplicated and bucketed into fixed,
//! non-overlapping windows of two consecutive distinct dates
//! (`window = date_index / 2`). Each window allows at most one
//! senior+senior pairing.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Distinct dates per quota window.
pub const DATES_PER_WINDOW: usize = 2;

/// Scarce pairings allowed per window.
pub const MAX_SCARCE_PER_WINDOW: u32 = 1;

/// Tracks scarce-pairing usage per quota window.
#[derive(Debug, Clone, Default)]
pub struct QuotaTracker {
    window_of: BTreeMap<NaiveDate, usize>,
    used: BTreeMap<usize, u32>,
}

impl QuotaTracker {
    /// Builds windows from the run's exam dates (any order, duplicates allowed).
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut sorted: Vec<NaiveDate> = dates.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let window_of = sorted
            .into_iter()
            .enumerate()
            .map(|(idx, date)| (date, idx / DATES_PER_WINDOW))
            .collect();

        Self {
            window_of,
            used: BTreeMap::new(),
        }
    }

    /// Window index for a date, if the date belongs to the run.
    pub fn window_for(&self, date: NaiveDate) -> Option<usize> {
        self.window_of.get(&date).copied()
    }

    /// Scarce pairings used so far in a window.
    pub fn uses_in(&self, window: usize) -> u32 {
        self.used.get(&window).copied().unwrap_or(0)
    }

    /// Whether a scarce pairing is still allowed on `date`.
    ///
    /// Dates outside the run never allow one.
    pub fn is_allowed(&self, date: NaiveDate) -> bool {
        self.window_for(date)
            .is_some_and(|w| self.uses_in(w) < MAX_SCARCE_PER_WINDOW)
    }

    /// Counts one scarce pairing against `date`'s window.
    pub fn record_use(&mut self, date: NaiveDate) {
        if let Some(window) = self.window_for(date) {
            *self.used.entry(window).or_insert(0) += 1;
        }
    }

    /// Total scarce pairings recorded.
    pub fn total_uses(&self) -> u32 {
        self.used.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_windows_from_sorted_distinct_dates() {
        // Sorted distinct: 1, 3, 4, 9, 10 -> windows 0, 0, 1, 1, 2
        let q = QuotaTracker::from_dates(vec![d(9), d(1), d(4), d(1), d(3), d(10)]);
        assert_eq!(q.window_for(d(1)), Some(0));
        assert_eq!(q.window_for(d(3)), Some(0));
        assert_eq!(q.window_for(d(4)), Some(1));
        assert_eq!(q.window_for(d(9)), Some(1));
        assert_eq!(q.window_for(d(10)), Some(2));
        assert_eq!(q.window_for(d(2)), None);
    }

    #[test]
    fn test_one_use_per_window() {
        let mut q = QuotaTracker::from_dates(vec![d(1), d(2), d(3)]);
        assert!(q.is_allowed(d(1)));

        q.record_use(d(2));
        assert!(!q.is_allowed(d(1)));
        assert!(!q.is_allowed(d(2)));
        assert!(q.is_allowed(d(3)));
        assert_eq!(q.uses_in(0), 1);
        assert_eq!(q.total_uses(), 1);
    }

    #[test]
    fn test_unknown_date_never_allowed() {
        let mut q = QuotaTracker::from_dates(vec![d(1)]);
        assert!(!q.is_allowed(d(5)));
        q.record_use(d(5));
        assert_eq!(q.total_uses(), 0);
    }
}
