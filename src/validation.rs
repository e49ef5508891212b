//! Input validation for invigilation runs.
//!
//! Checks the structural integrity of a prefetched context and the rank
//! limit table before calculation. Detects:
//! - Duplicate teacher IDs within a pool
//! - A teacher listed in both pools with conflicting records
//! - Rank limits below 1
//!
//! Ranks referenced by teachers but missing from the limit table are not an
//! error (they are unrestricted); they are logged as warnings.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

use crate::config::RankLimits;
use crate::gateway::PrefetchedContext;
use crate::models::{Rank, Teacher};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two teachers in one pool share the same ID.
    DuplicateId,
    /// The same teacher ID carries different rank or workload in the two pools.
    ConflictingRecord,
    /// A rank limit is below 1.
    InvalidLimit,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a prefetched context against the rank limit table.
///
/// Checks:
/// 1. No duplicate teacher IDs in the supervisor pool
/// 2. No duplicate teacher IDs in the assistant pool
/// 3. A teacher in both pools has the same rank and period count in each
/// 4. Every configured limit is at least 1
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_context(context: &PrefetchedContext, limits: &RankLimits) -> ValidationResult {
    let mut errors = Vec::new();

    check_pool("supervisor", &context.supervisor_pool, &mut errors);
    check_pool("assistant", &context.assistant_pool, &mut errors);

    let supervisors: HashMap<&str, &Teacher> = context
        .supervisor_pool
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect();
    for t in &context.assistant_pool {
        if let Some(other) = supervisors.get(t.id.as_str()) {
            if other.rank != t.rank || other.periods != t.periods {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConflictingRecord,
                    format!(
                        "Teacher '{}' differs between pools ({} / {} periods vs {} / {} periods)",
                        t.id, other.rank, other.periods, t.rank, t.periods
                    ),
                ));
            }
        }
    }

    for (rank, value) in limits.iter() {
        if value < 1 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidLimit,
                format!("Rank limit for {rank} must be at least 1, got {value}"),
            ));
        }
    }

    let unlimited: BTreeSet<Rank> = context
        .supervisor_pool
        .iter()
        .chain(&context.assistant_pool)
        .map(|t| t.rank)
        .filter(|r| limits.limit_for(*r).is_none())
        .collect();
    for rank in unlimited {
        warn!(%rank, "no period limit configured; rank is unrestricted");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pool(label: &str, pool: &[Teacher], errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for t in pool {
        if !ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID in {label} pool: {}", t.id),
            ));
        }
    }
}
