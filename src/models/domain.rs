use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ordered experience scale used for wingman compatibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    /// Position on the scale, starting at zero for beginners
    pub fn rank(self) -> u8 {
        match self {
            ExperienceLevel::Beginner => 0,
            ExperienceLevel::Intermediate => 1,
            ExperienceLevel::Advanced => 2,
        }
    }

    /// Same level or exactly one step apart
    #[inline]
    pub fn is_adjacent_to(self, other: ExperienceLevel) -> bool {
        self.rank().abs_diff(other.rank()) <= 1
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a wingman match. Only `Pending` is written here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Completed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Declined => "declined",
            MatchStatus::Expired => "expired",
            MatchStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A user's registered location
///
/// Coordinates are `None` when privacy mode hides the precise location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    pub user_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub max_travel_miles: Option<f64>,
}

impl UserLocation {
    /// Both coordinates, if the user shares them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Experience facet of a user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub experience_level: ExperienceLevel,
    pub is_active: bool,
}

impl UserProfile {
    /// Minimal row written when a profile is missing
    pub fn with_defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            experience_level: ExperienceLevel::default(),
            is_active: true,
        }
    }
}

/// Two user ids in canonical order, `first < second`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalPair {
    first: Uuid,
    second: Uuid,
}

impl CanonicalPair {
    /// Returns `None` when both ids are the same user
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> Uuid {
        self.first
    }

    pub fn second(&self) -> Uuid {
        self.second
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.first == user_id || self.second == user_id
    }
}

impl fmt::Display for CanonicalPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Persisted wingman match row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WingmanMatch {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl WingmanMatch {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    /// The other participant, if `user_id` is part of this match
    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.user_a_id == user_id {
            Some(self.user_b_id)
        } else if self.user_b_id == user_id {
            Some(self.user_a_id)
        } else {
            None
        }
    }

    pub fn pair(&self) -> Option<CanonicalPair> {
        CanonicalPair::new(self.user_a_id, self.user_b_id)
    }
}

/// Insert payload for the match writer
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub pair: CanonicalPair,
    pub created_at: DateTime<Utc>,
}

/// Located user as returned by the location store, before distance filtering
#[derive(Debug, Clone)]
pub struct LocatedUser {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub experience_level: ExperienceLevel,
}

/// Transient candidate pool entry for a single matching request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub experience_level: ExperienceLevel,
    pub distance_miles: f64,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Tunables for a matcher instance
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    pub default_radius_miles: f64,
    pub max_radius_miles: f64,
    pub recency_window: Duration,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            default_radius_miles: 25.0,
            max_radius_miles: 100.0,
            recency_window: Duration::days(7),
        }
    }
}
