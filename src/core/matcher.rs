use std::collections::{HashMap, HashSet};

use crate::core::{
    filters::{distance_between, matches_discovery_query},
    scoring::calculate_weighted_match_score,
};
use crate::models::{
    DiscoveryQuery, FriendRequest, FriendRequestStatus, MatchResult, MatchTier, Profile,
    RequestStatus, ScoredProfile, ScoringWeights,
};

/// Result of the ranking process
#[derive(Debug)]
pub struct RankedMatches {
    pub matches: Vec<ScoredProfile>,
    pub total_candidates: usize,
}

/// Relationship data fetched alongside the candidate pool
#[derive(Debug, Clone, Default)]
pub struct DiscoveryContext {
    /// Friend requests involving the viewer, in either direction
    pub friend_requests: Vec<FriendRequest>,
    /// Class ids the viewer is enrolled in this semester
    pub viewer_classes: Vec<String>,
    /// Class ids per candidate id for the same semester
    pub candidate_classes: HashMap<String, Vec<String>>,
}

/// Discovery orchestrator
///
/// # Pipeline Stages
/// 1. Exclusion (self, friends) and facet filtering
/// 2. Scoring against the viewer
/// 3. Ranking by score, stable for ties
/// 4. Truncation to the requested limit
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a single candidate against the viewer
    pub fn score(
        &self,
        viewer: &Profile,
        candidate: &Profile,
        shared_classes: &[String],
    ) -> MatchResult {
        calculate_weighted_match_score(viewer, candidate, shared_classes, &self.weights)
    }

    /// Rank candidates for the viewer's discovery feed
    ///
    /// # Arguments
    /// * `viewer` - The profile of the user browsing
    /// * `candidates` - Candidate profiles, in store order
    /// * `context` - Friend requests and class enrolments
    /// * `query` - Exclusions, facets and limit
    ///
    /// # Returns
    /// RankedMatches sorted by descending score; equal scores keep store order
    pub fn rank(
        &self,
        viewer: &Profile,
        candidates: Vec<Profile>,
        context: &DiscoveryContext,
        query: &DiscoveryQuery,
    ) -> RankedMatches {
        let total_candidates = candidates.len();
        let viewer_location = viewer.coordinate();

        let mut ranked: Vec<ScoredProfile> = candidates
            .into_iter()
            .filter(|profile| matches_discovery_query(profile, query, viewer_location))
            .map(|profile| {
                let classes = context
                    .candidate_classes
                    .get(&profile.id)
                    .map(|theirs| shared_classes(&context.viewer_classes, theirs))
                    .unwrap_or_default();

                let result = self.score(viewer, &profile, &classes);
                tracing::trace!("Scored {} -> {}: {}", viewer.id, profile.id, result.score);

                ScoredProfile {
                    request_status: request_status(&viewer.id, &profile.id, &context.friend_requests),
                    distance_miles: distance_between(viewer_location, &profile),
                    tier: MatchTier::from_score(result.score),
                    match_score: result.score,
                    match_reasons: result.reasons,
                    profile,
                }
            })
            .collect();

        // sort_by is stable, so ties stay in store order
        ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        ranked.truncate(query.limit);

        RankedMatches {
            matches: ranked,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Class ids both users are enrolled in, in the viewer's order
pub fn shared_classes(viewer: &[String], candidate: &[String]) -> Vec<String> {
    let theirs: HashSet<&String> = candidate.iter().collect();
    let mut seen = HashSet::new();
    viewer
        .iter()
        .filter(|id| theirs.contains(id) && seen.insert(*id))
        .cloned()
        .collect()
}

/// Pending request state between the viewer and a candidate
///
/// An outgoing pending request wins over an incoming one.
pub fn request_status(
    viewer_id: &str,
    candidate_id: &str,
    requests: &[FriendRequest],
) -> Option<RequestStatus> {
    let pending = |from: &str, to: &str| {
        requests.iter().any(|r| {
            r.status == FriendRequestStatus::Pending && r.from_user == from && r.to_user == to
        })
    };

    if pending(viewer_id, candidate_id) {
        Some(RequestStatus::Sent)
    } else if pending(candidate_id, viewer_id) {
        Some(RequestStatus::Pending)
    } else {
        None
    }
}
