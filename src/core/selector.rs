use std::cmp::Ordering;

use crate::models::Candidate;

/// Ordering used to pick a wingman: closest first, then smallest user id
#[inline]
pub fn selection_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance_miles
        .total_cmp(&b.distance_miles)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Pick exactly one candidate from the filtered pool
///
/// Deterministic: the same pool always yields the same candidate,
/// whatever order it arrives in.
pub fn select_candidate(pool: &[Candidate]) -> Option<&Candidate> {
    pool.iter().min_by(|a, b| selection_order(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel;
    use uuid::Uuid;

    fn candidate(id: u128, distance_miles: f64) -> Candidate {
        Candidate {
            user_id: Uuid::from_u128(id),
            latitude: 0.0,
            longitude: 0.0,
            city: None,
            experience_level: ExperienceLevel::Beginner,
            distance_miles,
        }
    }

    #[test]
    fn test_closest_wins() {
        let pool = vec![candidate(1, 1.2), candidate(2, 1.2), candidate(3, 0.8)];
        assert_eq!(select_candidate(&pool).unwrap().user_id, Uuid::from_u128(3));
    }

    #[test]
    fn test_tie_breaks_on_smaller_id() {
        let pool = vec![candidate(9, 1.2), candidate(4, 1.2)];
        assert_eq!(select_candidate(&pool).unwrap().user_id, Uuid::from_u128(4));
    }

    #[test]
    fn test_selection_ignores_input_order() {
        let pool = vec![candidate(5, 2.0), candidate(2, 3.5), candidate(7, 2.0), candidate(1, 9.0)];
        let mut reversed = pool.clone();
        reversed.reverse();

        let a = select_candidate(&pool).unwrap().user_id;
        let b = select_candidate(&reversed).unwrap().user_id;
        assert_eq!(a, b);
        assert_eq!(a, Uuid::from_u128(5));
    }

    #[test]
    fn test_empty_pool() {
        assert!(select_candidate(&[]).is_none());
    }
}
