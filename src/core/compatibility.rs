use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Candidate, ExperienceLevel};

/// Check if a candidate's experience level is compatible with the requester's
///
/// Compatible means the same level or exactly one step apart on
/// beginner < intermediate < advanced.
#[inline]
pub fn is_experience_compatible(requester: ExperienceLevel, candidate: &Candidate) -> bool {
    requester.is_adjacent_to(candidate.experience_level)
}

/// Check if a candidate was paired with the requester inside the recency window
///
/// `recent_partners` holds everyone who shares a match of any status with the
/// requester created inside the window.
#[inline]
pub fn is_recent_partner(candidate: &Candidate, recent_partners: &HashSet<Uuid>) -> bool {
    recent_partners.contains(&candidate.user_id)
}

/// Check if a candidate already holds a pending match with someone else
#[inline]
pub fn is_unavailable(candidate: &Candidate, busy_users: &HashSet<Uuid>) -> bool {
    busy_users.contains(&candidate.user_id)
}

/// Apply every compatibility rule to the raw candidate pool
///
/// Each rule is a per-candidate predicate, so the result does not depend on
/// pool order. An empty result means "no eligible candidates"; rules are
/// never relaxed to fill it.
pub fn filter_compatible(
    requester: ExperienceLevel,
    pool: Vec<Candidate>,
    recent_partners: &HashSet<Uuid>,
    busy_users: &HashSet<Uuid>,
) -> Vec<Candidate> {
    pool.into_iter()
        .filter(|c| is_experience_compatible(requester, c))
        .filter(|c| !is_recent_partner(c, recent_partners))
        .filter(|c| !is_unavailable(c, busy_users))
        .collect()
}
