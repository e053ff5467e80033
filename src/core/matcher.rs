use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{
    candidates::find_candidates,
    compatibility::filter_compatible,
    distance::haversine_distance,
    ensurer::{ensure_participants, ensure_profile},
    selector::select_candidate,
    writer::{write_match, WriteOutcome},
};
use crate::error::MatchError;
use crate::models::{CanonicalPair, MatchPolicy, Participant, UserLocation, WingmanMatch};
use crate::services::{LocationStore, MatchStore, ProfileStore, WingmanStore};

/// A match together with what the caller needs to show it
#[derive(Debug, Clone)]
pub struct MatchDetails {
    pub wingman_match: WingmanMatch,
    pub participants: Vec<Participant>,
    pub distance_miles: Option<f64>,
}

/// Result of an auto-match request
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// A new pending match was written
    Created(MatchDetails),
    /// The requester (or the pair) already had a pending match
    Existing(MatchDetails),
    /// Nobody passed the radius and compatibility rules
    NoCandidates,
}

/// Wingman matching orchestrator
///
/// # Pipeline Stages
/// 1. Requester resolution
/// 2. Pending-match throttle
/// 3. Location precondition, then profile ensuring
/// 4. Candidate search (bounding box, then Haversine radius)
/// 5. Compatibility filtering (experience, recency, availability)
/// 6. Deterministic selection
/// 7. Idempotent match write
///
/// Holds no state between requests; every decision reads the store.
#[derive(Clone)]
pub struct WingmanMatcher {
    store: Arc<dyn WingmanStore>,
    policy: MatchPolicy,
}

impl WingmanMatcher {
    pub fn new(store: Arc<dyn WingmanStore>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    pub fn with_default_policy(store: Arc<dyn WingmanStore>) -> Self {
        Self::new(store, MatchPolicy::default())
    }

    /// Parse a user id from a request path
    pub fn parse_user_id(raw: &str) -> Result<Uuid, MatchError> {
        Uuid::parse_str(raw.trim()).map_err(|_| MatchError::InvalidUserId(raw.to_string()))
    }

    /// Reject radii that are not positive, not finite, or above the configured maximum
    pub fn validate_radius(&self, radius_miles: f64) -> Result<f64, MatchError> {
        if radius_miles.is_finite() && radius_miles > 0.0 && radius_miles <= self.policy.max_radius_miles {
            Ok(radius_miles)
        } else {
            Err(MatchError::InvalidRadius(radius_miles))
        }
    }

    /// Radius used when the request did not name one
    ///
    /// The user's own travel radius wins over the configured default and is
    /// capped at the configured maximum.
    fn fallback_radius(&self, location: &UserLocation) -> f64 {
        location
            .max_travel_miles
            .filter(|r| r.is_finite() && *r > 0.0)
            .map(|r| r.min(self.policy.max_radius_miles))
            .unwrap_or(self.policy.default_radius_miles)
    }

    /// Find a wingman for `requester`, or return their existing pending match
    pub async fn auto_match(
        &self,
        requester: Uuid,
        radius_miles: Option<f64>,
    ) -> Result<MatchOutcome, MatchError> {
        self.auto_match_at(requester, radius_miles, Utc::now()).await
    }

    /// Same as [`auto_match`](Self::auto_match) with an explicit clock
    pub async fn auto_match_at(
        &self,
        requester: Uuid,
        radius_miles: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, MatchError> {
        let requested_radius = radius_miles.map(|r| self.validate_radius(r)).transpose()?;
        let store = self.store.as_ref();

        let location = store.get_location(requester).await?;
        let profile = store.get_profile(requester).await?;
        if location.is_none() && profile.is_none() {
            return Err(MatchError::UnknownUser(requester));
        }

        // Throttle: one pending match per user, checked before any selection work
        if let Some(existing) = store.find_pending_for_user(requester).await? {
            tracing::info!(
                "User {} already has pending match {}, returning it",
                requester,
                existing.id
            );
            return Ok(MatchOutcome::Existing(self.describe(existing, requester).await?));
        }

        let location = location.ok_or(MatchError::LocationRequired(requester))?;
        let origin = location
            .coordinates()
            .ok_or(MatchError::LocationRequired(requester))?;

        ensure_profile(store, requester).await?;

        let radius = requested_radius.unwrap_or_else(|| self.fallback_radius(&location));
        let level = profile.map(|p| p.experience_level).unwrap_or_default();

        tracing::info!(
            "Finding wingman for user {} (level: {}, radius: {} miles)",
            requester,
            level,
            radius
        );

        let pool = find_candidates(store, requester, origin, radius).await?;
        if pool.is_empty() {
            tracing::info!("No users within {} miles of {}", radius, requester);
            return Ok(MatchOutcome::NoCandidates);
        }

        let pool_ids: Vec<Uuid> = pool.iter().map(|c| c.user_id).collect();
        let since = now
            .checked_sub_signed(self.policy.recency_window)
            .ok_or_else(|| {
                MatchError::Misconfigured(format!(
                    "recency window {} reaches before the earliest representable time",
                    self.policy.recency_window
                ))
            })?;
        let recent_partners = store.partners_since(requester, since).await?;
        let busy_users = store.users_with_pending_match(&pool_ids).await?;

        let pool_size = pool.len();
        let eligible = filter_compatible(level, pool, &recent_partners, &busy_users);

        tracing::debug!(
            "User {}: {} candidates in radius, {} eligible ({} recent partners, {} busy)",
            requester,
            pool_size,
            eligible.len(),
            recent_partners.len(),
            busy_users.len()
        );

        let Some(chosen) = select_candidate(&eligible) else {
            tracing::info!("No eligible candidates for user {}", requester);
            return Ok(MatchOutcome::NoCandidates);
        };

        let pair = CanonicalPair::new(requester, chosen.user_id)
            .ok_or_else(|| MatchError::Conflict(format!("user {} selected as own wingman", requester)))?;

        ensure_participants(store, requester, chosen.user_id).await?;

        match write_match(store, pair, now).await? {
            Some(WriteOutcome::Created(created)) => {
                Ok(MatchOutcome::Created(self.describe(created, requester).await?))
            }
            Some(WriteOutcome::AlreadyExists(existing)) => {
                Ok(MatchOutcome::Existing(self.describe(existing, requester).await?))
            }
            None => Err(MatchError::Conflict(format!(
                "pending match for pair {} changed during write",
                pair
            ))),
        }
    }

    /// The user's current pending match
    pub async fn current_match(&self, user_id: Uuid) -> Result<MatchDetails, MatchError> {
        match self.store.find_pending_for_user(user_id).await? {
            Some(existing) => self.describe(existing, user_id).await,
            None => Err(MatchError::NoPendingMatch(user_id)),
        }
    }

    /// Ping the backing store
    pub async fn health_check(&self) -> bool {
        match self.store.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                false
            }
        }
    }

    /// Attach participant metadata, requester first
    async fn describe(&self, wingman_match: WingmanMatch, requester: Uuid) -> Result<MatchDetails, MatchError> {
        let partner = wingman_match
            .partner_of(requester)
            .ok_or_else(|| MatchError::Conflict(format!("user {} is not part of match {}", requester, wingman_match.id)))?;

        let mut participants = Vec::with_capacity(2);
        let mut coordinates = Vec::with_capacity(2);

        for user_id in [requester, partner] {
            let profile = self.store.get_profile(user_id).await?;
            let location = self.store.get_location(user_id).await?;

            coordinates.push(location.as_ref().and_then(UserLocation::coordinates));
            participants.push(Participant {
                user_id,
                experience_level: profile.map(|p| p.experience_level).unwrap_or_default(),
                city: location.and_then(|l| l.city),
                is_requester: user_id == requester,
            });
        }

        let distance_miles = match (coordinates[0], coordinates[1]) {
            (Some((lat1, lon1)), Some((lat2, lon2))) => Some(haversine_distance(lat1, lon1, lat2, lon2)),
            _ => None,
        };

        Ok(MatchDetails {
            wingman_match,
            participants,
            distance_miles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceLevel, MatchStatus, UserProfile};
    use crate::services::InMemoryStore;
    use chrono::Duration;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    async fn add_user(store: &InMemoryStore, id: u128, lat: f64, lon: f64, level: ExperienceLevel) {
        store
            .upsert_location(UserLocation {
                user_id: uid(id),
                latitude: Some(lat),
                longitude: Some(lon),
                city: Some("Chicago".to_string()),
                max_travel_miles: None,
            })
            .await;
        store
            .upsert_profile(UserProfile {
                user_id: uid(id),
                experience_level: level,
                is_active: true,
            })
            .await;
    }

    fn matcher(store: &Arc<InMemoryStore>) -> WingmanMatcher {
        WingmanMatcher::with_default_policy(store.clone())
    }

    #[tokio::test]
    async fn test_creates_match_with_closest_candidate() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Beginner).await;
        add_user(&store, 2, 41.8881, -87.6298, ExperienceLevel::Intermediate).await;
        add_user(&store, 3, 41.9781, -87.6298, ExperienceLevel::Beginner).await;

        let outcome = matcher(&store).auto_match(uid(1), None).await.unwrap();

        let details = match outcome {
            MatchOutcome::Created(details) => details,
            other => panic!("expected a new match, got {:?}", other),
        };
        assert!(details.wingman_match.involves(uid(2)));
        assert_eq!(details.wingman_match.status, MatchStatus::Pending);
        assert_eq!(details.participants.len(), 2);
        assert!(details.participants[0].is_requester);
        assert_eq!(details.participants[1].user_id, uid(2));
        assert!(details.distance_miles.unwrap() < 1.0);
    }

    #[tokio::test]
    async fn test_existing_pending_match_is_returned() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Beginner).await;
        add_user(&store, 2, 41.8881, -87.6298, ExperienceLevel::Beginner).await;
        let matcher = matcher(&store);

        let first = matcher.auto_match(uid(1), None).await.unwrap();
        let second = matcher.auto_match(uid(1), None).await.unwrap();

        let (MatchOutcome::Created(a), MatchOutcome::Existing(b)) = (first, second) else {
            panic!("expected created then existing");
        };
        assert_eq!(a.wingman_match.id, b.wingman_match.id);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = Arc::new(InMemoryStore::new());
        let result = matcher(&store).auto_match(uid(99), None).await;
        assert!(matches!(result, Err(MatchError::UnknownUser(id)) if id == uid(99)));
    }

    #[tokio::test]
    async fn test_invalid_radius_rejected_before_storage() {
        let store = Arc::new(InMemoryStore::new());
        store.set_offline(true);
        let matcher = matcher(&store);

        for radius in [0.0, -5.0, f64::NAN, 101.0] {
            let result = matcher.auto_match(uid(1), Some(radius)).await;
            assert!(matches!(result, Err(MatchError::InvalidRadius(_))));
        }
    }

    #[tokio::test]
    async fn test_travel_radius_used_when_not_requested() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Beginner).await;
        // ~6.9 miles north
        add_user(&store, 2, 41.9781, -87.6298, ExperienceLevel::Beginner).await;
        store
            .upsert_location(UserLocation {
                user_id: uid(1),
                latitude: Some(41.8781),
                longitude: Some(-87.6298),
                city: Some("Chicago".to_string()),
                max_travel_miles: Some(5.0),
            })
            .await;

        let matcher = matcher(&store);
        let outcome = matcher.auto_match(uid(1), None).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NoCandidates));

        let outcome = matcher.auto_match(uid(1), Some(10.0)).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_recency_window_uses_clock() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Beginner).await;
        add_user(&store, 2, 41.8881, -87.6298, ExperienceLevel::Beginner).await;
        let now = Utc::now();
        store
            .insert_match(WingmanMatch {
                id: Uuid::new_v4(),
                user_a_id: uid(1),
                user_b_id: uid(2),
                status: MatchStatus::Completed,
                created_at: now - Duration::days(6),
            })
            .await;
        let matcher = matcher(&store);

        let outcome = matcher.auto_match_at(uid(1), None, now).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NoCandidates));

        let later = now + Duration::days(2);
        let outcome = matcher.auto_match_at(uid(1), None, later).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_window_beyond_clock_range_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Beginner).await;
        add_user(&store, 2, 41.8881, -87.6298, ExperienceLevel::Beginner).await;
        let policy = MatchPolicy {
            recency_window: Duration::try_days(1_000_000_000).unwrap(),
            ..MatchPolicy::default()
        };
        let matcher = WingmanMatcher::new(store.clone(), policy);

        let result = matcher.auto_match(uid(1), None).await;

        assert!(matches!(result, Err(MatchError::Misconfigured(_))));
        assert!(store.matches().await.is_empty());
    }

    #[tokio::test]
    async fn test_setup_incomplete_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_location(UserLocation {
                user_id: uid(1),
                latitude: None,
                longitude: None,
                city: Some("Chicago".to_string()),
                max_travel_miles: None,
            })
            .await;

        let result = matcher(&store).auto_match(uid(1), None).await;

        assert!(matches!(result, Err(MatchError::LocationRequired(_))));
        assert!(store.get_profile(uid(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_match() {
        let store = Arc::new(InMemoryStore::new());
        add_user(&store, 1, 41.8781, -87.6298, ExperienceLevel::Advanced).await;
        add_user(&store, 2, 41.8881, -87.6298, ExperienceLevel::Advanced).await;
        let matcher = matcher(&store);

        assert!(matches!(
            matcher.current_match(uid(2)).await,
            Err(MatchError::NoPendingMatch(_))
        ));

        matcher.auto_match(uid(1), None).await.unwrap();
        let details = matcher.current_match(uid(2)).await.unwrap();
        assert_eq!(details.participants[0].user_id, uid(2));
        assert_eq!(details.participants[1].user_id, uid(1));
    }
}
