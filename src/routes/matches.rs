use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{MatchDetails, MatchOutcome, WingmanMatcher};
use crate::error::MatchError;
use crate::models::{AutoMatchRequest, AutoMatchResponse, HealthResponse, NO_MATCH_STATUS};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: WingmanMatcher,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/auto/{user_id}", web::post().to(auto_match))
        .route("/matches/current/{user_id}", web::get().to(current_match));
}

fn details_response(details: MatchDetails, created: bool) -> AutoMatchResponse {
    AutoMatchResponse {
        match_id: Some(details.wingman_match.id),
        status: details.wingman_match.status.to_string(),
        created,
        participants: details.participants,
        distance_miles: details.distance_miles,
        message: None,
    }
}

fn no_match_response() -> AutoMatchResponse {
    AutoMatchResponse {
        match_id: None,
        status: NO_MATCH_STATUS.to_string(),
        created: false,
        participants: Vec::new(),
        distance_miles: None,
        message: Some("No eligible wingman candidates nearby right now".to_string()),
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.matcher.health_check().await;

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Auto-match endpoint
///
/// POST /api/matches/auto/{user_id}
///
/// Request body (optional):
/// ```json
/// {
///   "radius_miles": 10
/// }
/// ```
async fn auto_match(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, MatchError> {
    let user_id = WingmanMatcher::parse_user_id(&path)?;

    let req = AutoMatchRequest::from_body(&body)
        .map_err(|e| MatchError::InvalidRequest(format!("Invalid JSON: {}", e)))?;

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for auto_match request: field_errors={:?}", errors);
        return Err(req
            .radius_miles
            .map_or_else(|| MatchError::InvalidRequest(errors.to_string()), MatchError::InvalidRadius));
    }

    tracing::info!("Auto-match requested for user {}, radius: {:?}", user_id, req.radius_miles);

    let response = match state.matcher.auto_match(user_id, req.radius_miles).await? {
        MatchOutcome::Created(details) => {
            HttpResponse::Created().json(details_response(details, true))
        }
        MatchOutcome::Existing(details) => {
            HttpResponse::Ok().json(details_response(details, false))
        }
        MatchOutcome::NoCandidates => HttpResponse::Ok().json(no_match_response()),
    };

    Ok(response)
}

/// Current pending match for a user
///
/// GET /api/matches/current/{user_id}
async fn current_match(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let user_id = WingmanMatcher::parse_user_id(&path)?;
    let details = state.matcher.current_match(user_id).await?;

    Ok(HttpResponse::Ok().json(details_response(details, false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_response_shape() {
        let response = no_match_response();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "no_match");
        assert!(json["match_id"].is_null());
        assert_eq!(json["participants"].as_array().unwrap().len(), 0);
        assert!(json.get("distance_miles").is_none());
    }
}
