// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod otp;
pub mod scoring;

pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box, Coordinate, CoordinateError};
pub use filters::{matches_discovery_query, matches_interests, matches_year, within_radius};
pub use matcher::{DiscoveryContext, Matcher, RankedMatches};
pub use otp::{generate_code, OtpPolicy};
pub use scoring::{calculate_match_score, calculate_weighted_match_score};
