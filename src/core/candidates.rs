use uuid::Uuid;

use crate::core::distance::{calculate_bounding_box, haversine_distance};
use crate::models::{Candidate, LocatedUser};
use crate::services::{LocationStore, StoreError};

/// Keep located users whose Haversine distance from the origin is within `radius_miles`
///
/// Stage 2 of candidate retrieval; stage 1 is the storage bounding-box query.
pub fn within_radius(
    origin: (f64, f64),
    radius_miles: f64,
    users: Vec<LocatedUser>,
) -> Vec<Candidate> {
    let (lat, lon) = origin;

    users
        .into_iter()
        .filter_map(|user| {
            let distance_miles = haversine_distance(lat, lon, user.latitude, user.longitude);
            (distance_miles <= radius_miles).then(|| Candidate {
                user_id: user.user_id,
                latitude: user.latitude,
                longitude: user.longitude,
                city: user.city,
                experience_level: user.experience_level,
                distance_miles,
            })
        })
        .collect()
}

/// Find other active users within `radius_miles` of `origin`
///
/// The requester is never part of the result. An empty result is not an error.
pub async fn find_candidates<S>(
    store: &S,
    requester_id: Uuid,
    origin: (f64, f64),
    radius_miles: f64,
) -> Result<Vec<Candidate>, StoreError>
where
    S: LocationStore + ?Sized,
{
    let bbox = calculate_bounding_box(origin.0, origin.1, radius_miles);
    let located = store.located_users_in_box(&bbox, requester_id).await?;
    let scanned = located.len();

    let candidates: Vec<Candidate> = within_radius(origin, radius_miles, located)
        .into_iter()
        .filter(|c| c.user_id != requester_id)
        .collect();

    tracing::debug!(
        "Candidate search for {}: {} in bounding box, {} within {} miles",
        requester_id,
        scanned,
        candidates.len(),
        radius_miles
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel;

    fn located(id: u128, lat: f64, lon: f64) -> LocatedUser {
        LocatedUser {
            user_id: Uuid::from_u128(id),
            latitude: lat,
            longitude: lon,
            city: None,
            experience_level: ExperienceLevel::Intermediate,
        }
    }

    #[test]
    fn test_within_radius_drops_far_users() {
        // Austin downtown, ~1mi north, and San Antonio (~75mi)
        let origin = (30.2672, -97.7431);
        let users = vec![
            located(1, 30.2817, -97.7431),
            located(2, 29.4241, -98.4936),
        ];

        let candidates = within_radius(origin, 10.0, users);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].user_id, Uuid::from_u128(1));
        assert!(candidates[0].distance_miles > 0.9 && candidates[0].distance_miles < 1.1);
    }

    #[test]
    fn test_within_radius_respects_bound() {
        let origin = (30.2672, -97.7431);
        let users: Vec<LocatedUser> = (0..50)
            .map(|i| located(i, 30.2672 + i as f64 * 0.01, -97.7431))
            .collect();

        for candidate in within_radius(origin, 15.0, users) {
            assert!(candidate.distance_miles <= 15.0);
        }
    }
}
