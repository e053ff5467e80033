use serde::{Deserialize, Serialize};
use validator::Validate;

/// Optional body of an auto-match request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AutoMatchRequest {
    /// Coarse sanity bound only; `WingmanMatcher::validate_radius` enforces
    /// the configured `matching.max_radius_miles`
    #[validate(range(min = 0.1, max = 500.0))]
    #[serde(default, alias = "radiusMiles")]
    pub radius_miles: Option<f64>,
}

impl AutoMatchRequest {
    /// Parse a request body, treating an empty body as "no options"
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}
