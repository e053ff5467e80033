//! Storage ports used by the matcher.
//!
//! The matcher only talks to these traits, so it runs unchanged against
//! PostgreSQL in production and the in-process store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BoundingBox, CanonicalPair, LocatedUser, NewMatch, UserLocation, UserProfile, WingmanMatch};

/// Errors that can occur when reading or writing matching data
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Pending match already exists for pair {0}")]
    DuplicatePair(CanonicalPair),
}

/// Read access to user locations
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Location row for a user, `None` when the user never set one
    async fn get_location(&self, user_id: Uuid) -> Result<Option<UserLocation>, StoreError>;

    /// Active users with coordinates inside `bbox`, excluding `exclude_user_id`
    async fn located_users_in_box(
        &self,
        bbox: &BoundingBox,
        exclude_user_id: Uuid,
    ) -> Result<Vec<LocatedUser>, StoreError>;
}

/// Read/write access to user profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Insert a default profile if none exists. Returns `true` when a row was created.
    async fn ensure_profile(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

/// Access to the wingman match table
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Oldest pending match the user participates in
    async fn find_pending_for_user(&self, user_id: Uuid) -> Result<Option<WingmanMatch>, StoreError>;

    async fn find_pending_for_pair(&self, pair: CanonicalPair) -> Result<Option<WingmanMatch>, StoreError>;

    /// Subset of `user_ids` that currently hold a pending match with anyone
    async fn users_with_pending_match(&self, user_ids: &[Uuid]) -> Result<HashSet<Uuid>, StoreError>;

    /// Users that share a match of any status with `user_id` created at or after `since`
    async fn partners_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>, StoreError>;

    /// Insert a pending match.
    ///
    /// Fails with [`StoreError::DuplicatePair`] when the pair already has a pending row.
    async fn create_match(&self, new_match: NewMatch) -> Result<WingmanMatch, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Everything the matcher needs from storage
pub trait WingmanStore: LocationStore + ProfileStore + MatchStore {}

impl<T> WingmanStore for T where T: LocationStore + ProfileStore + MatchStore {}
