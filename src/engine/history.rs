//! Pair history per recurring room/group identity.
//!
//! Used only to bias selection toward new combinations. Never a hard
//! constraint.

use std::collections::HashMap;

use crate::models::PairRecord;

/// Past pair records keyed by history key, in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    by_key: HashMap<String, Vec<PairRecord>>,
}

impl PairHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record for a history key.
    pub fn record(&mut self, key: &str, pair: PairRecord) {
        self.by_key.entry(key.to_string()).or_default().push(pair);
    }

    /// Records for a history key (empty if none).
    pub fn records(&self, key: &str) -> &[PairRecord] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of history keys seen.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Whether `teacher_id` was ever the supervisor in `records`.
pub fn has_supervised(records: &[PairRecord], teacher_id: &str) -> bool {
    records
        .iter()
        .any(|r| r.supervisor.as_deref() == Some(teacher_id))
}

/// Whether `supervisor` and `assistant` were ever paired in `records`.
pub fn has_paired(records: &[PairRecord], supervisor: &str, assistant: &str) -> bool {
    records.iter().any(|r| r.pairs(supervisor, assistant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(s: &str, a: Option<&str>) -> PairRecord {
        PairRecord {
            supervisor: Some(s.to_string()),
            assistant: a.map(str::to_string),
        }
    }

    #[test]
    fn test_records_per_key() {
        let mut h = PairHistory::new();
        assert!(h.is_empty());
        h.record("G1", pair("S1", Some("L1")));
        h.record("G1", pair("S2", None));
        h.record("G2", pair("S3", Some("L2")));

        assert_eq!(h.len(), 2);
        assert_eq!(h.records("G1").len(), 2);
        assert!(h.records("unknown").is_empty());
    }

    #[test]
    fn test_history_queries() {
        let records = vec![pair("S1", Some("L1")), pair("S2", None)];
        assert!(has_supervised(&records, "S1"));
        assert!(has_supervised(&records, "S2"));
        assert!(!has_supervised(&records, "L1"));

        assert!(has_paired(&records, "S1", "L1"));
        assert!(!has_paired(&records, "S2", "L1"));
        assert!(!has_paired(&records, "L1", "S1"));
    }
}
