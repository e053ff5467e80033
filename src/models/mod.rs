// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, Candidate, CanonicalPair, ExperienceLevel, LocatedUser, MatchPolicy, MatchStatus,
    NewMatch, UserLocation, UserProfile, WingmanMatch,
};
pub use requests::AutoMatchRequest;
pub use responses::{AutoMatchResponse, ErrorResponse, HealthResponse, Participant, NO_MATCH_STATUS};
