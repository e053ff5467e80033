//! WingmanMatch - accountability buddy matching service
//!
//! This library pairs users with a nearby "wingman" of compatible experience.
//! Matching runs per request against the persisted match table: candidates are
//! found by distance, filtered by experience and recent pairings, and the
//! closest one is written as a pending match under a canonical pair ordering.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{WingmanMatcher, MatchOutcome, MatchDetails, distance::{haversine_distance, calculate_bounding_box}};
pub use error::MatchError;
pub use models::{Candidate, CanonicalPair, ExperienceLevel, MatchPolicy, MatchStatus, UserLocation, UserProfile, WingmanMatch};
pub use services::{InMemoryStore, PostgresClient, StoreError, WingmanStore};
