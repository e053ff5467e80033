// Core algorithm exports
pub mod candidates;
pub mod compatibility;
pub mod distance;
pub mod ensurer;
pub mod matcher;
pub mod selector;
pub mod writer;

pub use candidates::{find_candidates, within_radius};
pub use compatibility::{filter_compatible, is_experience_compatible, is_recent_partner, is_unavailable};
pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box};
pub use ensurer::{ensure_participants, ensure_profile};
pub use matcher::{MatchDetails, MatchOutcome, WingmanMatcher};
pub use selector::{select_candidate, selection_order};
pub use writer::{write_match, WriteOutcome};
