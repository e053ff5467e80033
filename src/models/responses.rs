use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::ExperienceLevel;

/// Status reported when no eligible wingman was found
pub const NO_MATCH_STATUS: &str = "no_match";

/// One side of a wingman match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub experience_level: ExperienceLevel,
    pub city: Option<String>,
    pub is_requester: bool,
}

/// Response for the auto-match and current-match endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMatchResponse {
    pub match_id: Option<Uuid>,
    pub status: String,
    pub created: bool,
    pub participants: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub retryable: bool,
}
