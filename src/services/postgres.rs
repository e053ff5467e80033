use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    BoundingBox, CanonicalPair, ExperienceLevel, LocatedUser, MatchStatus, NewMatch, UserLocation,
    UserProfile, WingmanMatch,
};
use crate::services::store::{LocationStore, MatchStore, ProfileStore, StoreError};

/// Unique index guarding one pending row per canonical pair
const PENDING_PAIR_CONSTRAINT: &str = "uq_wingman_matches_pending_pair";

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

const MATCH_COLUMNS: &str = "id, user_a_id, user_b_id, status, created_at";

/// PostgreSQL client backing all matcher stores
///
/// The `wingman_matches` table carries a partial unique index on the
/// canonical pair, which is the only serialization point between
/// concurrent match requests.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

/// True when `err` is the pending-pair unique violation
fn is_pending_pair_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(PENDING_PAIR_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl LocationStore for PostgresClient {
    async fn get_location(&self, user_id: Uuid) -> Result<Option<UserLocation>, StoreError> {
        let query = r#"
            SELECT user_id, latitude, longitude, city, max_travel_miles
            FROM user_locations
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserLocation, StoreError> {
            Ok(UserLocation {
                user_id: row.try_get("user_id")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                city: row.try_get("city")?,
                max_travel_miles: row.try_get("max_travel_miles")?,
            })
        })
        .transpose()
    }

    async fn located_users_in_box(
        &self,
        bbox: &BoundingBox,
        exclude_user_id: Uuid,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        // Users without a profile row count as active beginners
        let query = r#"
            SELECT l.user_id, l.latitude, l.longitude, l.city,
                   COALESCE(p.experience_level, 'beginner') AS experience_level
            FROM user_locations l
            LEFT JOIN user_profiles p ON p.user_id = l.user_id
            WHERE l.user_id <> $1
              AND l.latitude IS NOT NULL
              AND l.longitude IS NOT NULL
              AND l.latitude BETWEEN $2 AND $3
              AND l.longitude BETWEEN $4 AND $5
              AND COALESCE(p.is_active, TRUE)
        "#;

        let rows = sqlx::query(query)
            .bind(exclude_user_id)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .iter()
            .map(|row| -> Result<LocatedUser, sqlx::Error> {
                Ok(LocatedUser {
                    user_id: row.try_get("user_id")?,
                    latitude: row.try_get("latitude")?,
                    longitude: row.try_get("longitude")?,
                    city: row.try_get("city")?,
                    experience_level: row.try_get::<ExperienceLevel, _>("experience_level")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("Bounding box query returned {} located users", users.len());

        Ok(users)
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let query = r#"
            SELECT user_id, experience_level, is_active
            FROM user_profiles
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<UserProfile, StoreError> {
            Ok(UserProfile {
                user_id: row.try_get("user_id")?,
                experience_level: row.try_get("experience_level")?,
                is_active: row.try_get("is_active")?,
            })
        })
        .transpose()
    }

    async fn ensure_profile(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let defaults = UserProfile::with_defaults(user_id);
        let query = r#"
            INSERT INTO user_profiles (user_id, experience_level, is_active)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(defaults.user_id)
            .bind(defaults.experience_level)
            .bind(defaults.is_active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn find_pending_for_user(&self, user_id: Uuid) -> Result<Option<WingmanMatch>, StoreError> {
        let query = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM wingman_matches
            WHERE status = $1 AND (user_a_id = $2 OR user_b_id = $2)
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#
        );

        let found = sqlx::query_as::<_, WingmanMatch>(&query)
            .bind(MatchStatus::Pending)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn find_pending_for_pair(&self, pair: CanonicalPair) -> Result<Option<WingmanMatch>, StoreError> {
        let query = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM wingman_matches
            WHERE status = $1 AND user_a_id = $2 AND user_b_id = $3
            "#
        );

        let found = sqlx::query_as::<_, WingmanMatch>(&query)
            .bind(MatchStatus::Pending)
            .bind(pair.first())
            .bind(pair.second())
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn users_with_pending_match(&self, user_ids: &[Uuid]) -> Result<HashSet<Uuid>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let query = r#"
            SELECT user_a_id AS user_id FROM wingman_matches
            WHERE status = $1 AND user_a_id = ANY($2)
            UNION
            SELECT user_b_id AS user_id FROM wingman_matches
            WHERE status = $1 AND user_b_id = ANY($2)
        "#;

        let rows = sqlx::query(query)
            .bind(MatchStatus::Pending)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        let busy = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("user_id"))
            .collect::<Result<HashSet<_>, sqlx::Error>>()?;

        Ok(busy)
    }

    async fn partners_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HashSet<Uuid>, StoreError> {
        let query = r#"
            SELECT CASE WHEN user_a_id = $1 THEN user_b_id ELSE user_a_id END AS partner_id
            FROM wingman_matches
            WHERE (user_a_id = $1 OR user_b_id = $1)
              AND created_at >= $2
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let partners = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("partner_id"))
            .collect::<Result<HashSet<_>, sqlx::Error>>()?;

        tracing::debug!("User {} has {} recent partners", user_id, partners.len());

        Ok(partners)
    }

    async fn create_match(&self, new_match: NewMatch) -> Result<WingmanMatch, StoreError> {
        let query = format!(
            r#"
            INSERT INTO wingman_matches (id, user_a_id, user_b_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, WingmanMatch>(&query)
            .bind(Uuid::new_v4())
            .bind(new_match.pair.first())
            .bind(new_match.pair.second())
            .bind(MatchStatus::Pending)
            .bind(new_match.created_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_pending_pair_violation(&e) => Err(StoreError::DuplicatePair(new_match.pair)),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_error_is_not_violation() {
        assert!(!is_pending_pair_violation(&sqlx::Error::RowNotFound));
        assert!(!is_pending_pair_violation(&sqlx::Error::PoolTimedOut));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_duplicate_pending_pair_is_detected() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let client = PostgresClient::from_settings(&url, Some(2), Some(1), None, None)
            .await
            .expect("Failed to connect");

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        client.ensure_profile(a).await.unwrap();
        client.ensure_profile(b).await.unwrap();

        let pair = CanonicalPair::new(a, b).unwrap();
        let first = client
            .create_match(NewMatch { pair, created_at: Utc::now() })
            .await
            .unwrap();

        let second = client
            .create_match(NewMatch { pair, created_at: Utc::now() })
            .await;
        assert!(matches!(second, Err(StoreError::DuplicatePair(p)) if p == pair));

        let pending = client.find_pending_for_pair(pair).await.unwrap();
        assert_eq!(pending.map(|m| m.id), Some(first.id));
    }
}
