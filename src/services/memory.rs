//! In-process implementation of the storage ports.
//!
//! Mirrors the PostgreSQL schema rules that matter to the matcher: the
//! canonical-pair check and the one-pending-row-per-pair unique index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::distance::is_within_bounding_box;
use crate::models::{
    BoundingBox, CanonicalPair, LocatedUser, MatchStatus, NewMatch, UserLocation, UserProfile,
    WingmanMatch,
};
use crate::services::store::{LocationStore, MatchStore, ProfileStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    locations: HashMap<Uuid, UserLocation>,
    profiles: HashMap<Uuid, UserProfile>,
    matches: Vec<WingmanMatch>,
}

/// Store backed by in-memory tables, used by tests and benchmarks
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_location(&self, location: UserLocation) {
        self.tables.write().await.locations.insert(location.user_id, location);
    }

    pub async fn upsert_profile(&self, profile: UserProfile) {
        self.tables.write().await.profiles.insert(profile.user_id, profile);
    }

    /// Insert a match row as-is, bypassing the pending-pair constraint.
    /// Used to seed match history.
    pub async fn insert_match(&self, wingman_match: WingmanMatch) {
        self.tables.write().await.matches.push(wingman_match);
    }

    pub async fn matches(&self) -> Vec<WingmanMatch> {
        self.tables.read().await.matches.clone()
    }

    /// Simulate the database being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::SqlxError(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn get_location(&self, user_id: Uuid) -> Result<Option<UserLocation>, StoreError> {
        self.check_online()?;
        Ok(self.tables.read().await.locations.get(&user_id).cloned())
    }

    async fn located_users_in_box(
        &self,
        bbox: &BoundingBox,
        exclude_user_id: Uuid,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        self.check_online()?;
        let tables = self.tables.read().await;

        let users = tables
            .locations
            .values()
            .filter(|location| location.user_id != exclude_user_id)
            .filter_map(|location| {
                let (latitude, longitude) = location.coordinates()?;
                if !is_within_bounding_box(latitude, longitude, bbox) {
                    return None;
                }

                let profile = tables.profiles.get(&location.user_id);
                if profile.is_some_and(|p| !p.is_active) {
                    return None;
                }

                Some(LocatedUser {
                    user_id: location.user_id,
                    latitude,
                    longitude,
                    city: location.city.clone(),
                    experience_level: profile.map(|p| p.experience_level).unwrap_or_default(),
                })
            })
            .collect();

        Ok(users)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.check_online()?;
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn ensure_profile(&self, user_id: Uuid) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&user_id) {
            return Ok(false);
        }
        tables.profiles.insert(user_id, UserProfile::with_defaults(user_id));
        Ok(true)
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn find_pending_for_user(&self, user_id: Uuid) -> Result<Option<WingmanMatch>, StoreError> {
        self.check_online()?;
        let tables = self.tables.read().await;

        Ok(tables
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Pending && m.involves(user_id))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn find_pending_for_pair(&self, pair: CanonicalPair) -> Result<Option<WingmanMatch>, StoreError> {
        self.check_online()?;
        let tables = self.tables.read().await;

        Ok(tables
            .matches
            .iter()
            .find(|m| m.status == MatchStatus::Pending && m.pair() == Some(pair))
            .cloned())
    }

    async fn users_with_pending_match(&self, user_ids: &[Uuid]) -> Result<HashSet<Uuid>, StoreError> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let wanted: HashSet<&Uuid> = user_ids.iter().collect();

        Ok(tables
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
            .flat_map(|m| [m.user_a_id, m.user_b_id])
            .filter(|id| wanted.contains(id))
            .collect())
    }

    async fn partners_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>, StoreError> {
        self.check_online()?;
        let tables = self.tables.read().await;

        Ok(tables
            .matches
            .iter()
            .filter(|m| m.created_at >= since)
            .filter_map(|m| m.partner_of(user_id))
            .collect())
    }

    async fn create_match(&self, new_match: NewMatch) -> Result<WingmanMatch, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.write().await;

        let duplicate = tables
            .matches
            .iter()
            .any(|m| m.status == MatchStatus::Pending && m.pair() == Some(new_match.pair));
        if duplicate {
            return Err(StoreError::DuplicatePair(new_match.pair));
        }

        let created = WingmanMatch {
            id: Uuid::new_v4(),
            user_a_id: new_match.pair.first(),
            user_b_id: new_match.pair.second(),
            status: MatchStatus::Pending,
            created_at: new_match.created_at,
        };
        tables.matches.push(created.clone());

        Ok(created)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.offline.load(Ordering::SeqCst))
    }
}
