//! Spartan Match - match scoring and discovery service for SpartanFinder
//!
//! This library provides the scoring algorithm that ranks student profiles
//! on the discovery feed, plus the passcode sign-in handlers.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, calculate_match_score, distance::{haversine_distance, Coordinate}};
pub use models::{Profile, Year, MatchResult, ScoredProfile, ScoringWeights, FindMatchesRequest, FindMatchesResponse};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let result = calculate_match_score(&Profile::default(), &Profile::default(), &[]);
        assert_eq!(result.score, 0);
        assert_eq!(haversine_distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }
}
