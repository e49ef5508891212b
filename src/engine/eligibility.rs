//! Eligibility predicate.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::config::RankLimits;
use crate::models::Teacher;

/// Whether a teacher may take a role on `date`.
///
/// True iff the teacher is available that date, is not already in
/// `used_today`, and is strictly under their rank's period cap (or the
/// rank has no cap). Callers add chosen teachers to `used_today` themselves.
pub fn is_eligible(
    teacher: &Teacher,
    limits: &RankLimits,
    used_today: &HashSet<String>,
    date: NaiveDate,
) -> bool {
    teacher.is_available_on(date)
        && !used_today.contains(&teacher.id)
        && limits.allows(teacher.rank, teacher.periods)
}
