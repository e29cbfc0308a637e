use std::collections::HashSet;

use crate::models::{MatchResult, Profile, ScoringWeights};

/// Hard ceiling applied after all factors are summed
pub const MAX_SCORE: u32 = 100;

/// Interest lists longer than this are summarised in the reason text
const LISTED_INTERESTS: usize = 3;

/// Calculate a match score (0-100) and reasons using the default weights
///
/// Factors are evaluated in a fixed order and each one that fires appends
/// exactly one reason:
///
/// | factor               | points          | cap |
/// |----------------------|-----------------|-----|
/// | shared interests     | 8 per interest  | 40  |
/// | same major (any case)| 15              | 15  |
/// | same year            | 10              | 10  |
/// | shared looking-for   | 8 per tag       | 16  |
/// | same campus area     | 5               | 5   |
/// | same dorm            | 10              | 10  |
/// | shared classes       | 12 per class    | 24  |
///
/// The capped factors sum to at most 120; the result is clamped to 100.
pub fn calculate_match_score(
    viewer: &Profile,
    candidate: &Profile,
    shared_classes: &[String],
) -> MatchResult {
    calculate_weighted_match_score(viewer, candidate, shared_classes, &ScoringWeights::default())
}

/// Same as [`calculate_match_score`] with explicit weights
///
/// Tags are compared as sets: repeated tags in either list count once, so
/// swapping `viewer` and `candidate` never changes the score.
pub fn calculate_weighted_match_score(
    viewer: &Profile,
    candidate: &Profile,
    shared_classes: &[String],
    weights: &ScoringWeights,
) -> MatchResult {
    let mut tally = Tally::default();

    let shared_interests = shared_tags(&viewer.interests, &candidate.interests);
    if !shared_interests.is_empty() {
        tally.award(
            capped(shared_interests.len(), weights.interest_points, weights.interest_cap),
            || describe_interests(&shared_interests),
        );
    }

    if let (Some(mine), Some(theirs)) = (viewer.major(), candidate.major()) {
        if mine.to_lowercase() == theirs.to_lowercase() {
            tally.award(weights.major, || format!("Same major: {}", theirs));
        }
    }

    if let (Some(mine), Some(theirs)) = (viewer.year, candidate.year) {
        if mine == theirs {
            tally.award(weights.year, || format!("Same year: {}", theirs));
        }
    }

    let shared_looking_for = shared_tags(&viewer.looking_for, &candidate.looking_for);
    if !shared_looking_for.is_empty() {
        tally.award(
            capped(shared_looking_for.len(), weights.looking_for_points, weights.looking_for_cap),
            || format!("Both looking for: {}", shared_looking_for.join(", ")),
        );
    }

    if let (Some(mine), Some(theirs)) = (viewer.campus_area(), candidate.campus_area()) {
        if mine == theirs {
            tally.award(weights.campus_area, || format!("Same area: {}", theirs));
        }
    }

    if let (Some(mine), Some(theirs)) = (viewer.dorm(), candidate.dorm()) {
        if mine == theirs {
            tally.award(weights.dorm, || format!("Same dorm: {}", theirs));
        }
    }

    if !shared_classes.is_empty() {
        let count = shared_classes.len();
        tally.award(
            capped(count, weights.class_points, weights.class_cap),
            || format!("{} shared class{}", count, if count > 1 { "es" } else { "" }),
        );
    }

    tally.finish()
}

/// Running sum plus the reasons collected so far
#[derive(Default)]
struct Tally {
    raw: u32,
    reasons: Vec<String>,
}

impl Tally {
    /// Zero-point awards leave no reason behind
    fn award(&mut self, points: u32, reason: impl FnOnce() -> String) {
        if points == 0 {
            return;
        }
        self.raw = self.raw.saturating_add(points);
        self.reasons.push(reason());
    }

    fn finish(self) -> MatchResult {
        let score = u8::try_from(self.raw.min(MAX_SCORE)).unwrap_or(u8::MAX);
        MatchResult {
            score,
            reasons: self.reasons,
        }
    }
}

#[inline]
fn capped(count: usize, points: u32, cap: u32) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(points)
        .min(cap)
}

/// Tags present in both lists, in the viewer's order, each listed once
fn shared_tags<'a>(viewer: &'a [String], candidate: &[String]) -> Vec<&'a str> {
    let theirs: HashSet<&str> = candidate.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    viewer
        .iter()
        .map(String::as_str)
        .filter(|tag| theirs.contains(tag) && seen.insert(*tag))
        .collect()
}

fn describe_interests(shared: &[&str]) -> String {
    if shared.len() <= LISTED_INTERESTS {
        format!("Shared interests: {}", shared.join(", "))
    } else {
        format!(
            "{} shared interests including {}",
            shared.len(),
            shared[..2].join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Year;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn profile_with_interests(items: &[&str]) -> Profile {
        Profile {
            id: "p".to_string(),
            interests: tags(items),
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_tags_keeps_viewer_order() {
        let viewer = tags(&["Music", "Gaming", "Art"]);
        let candidate = tags(&["Art", "Music"]);
        assert_eq!(shared_tags(&viewer, &candidate), vec!["Music", "Art"]);
    }

    #[test]
    fn test_shared_tags_dedupes() {
        let viewer = tags(&["Music", "Music", "Music"]);
        let candidate = tags(&["Music"]);
        assert_eq!(shared_tags(&viewer, &candidate), vec!["Music"]);
    }

    #[test]
    fn test_capped() {
        assert_eq!(capped(2, 8, 40), 16);
        assert_eq!(capped(5, 8, 40), 40);
        assert_eq!(capped(usize::MAX, 8, 40), 40);
    }

    #[test]
    fn test_interest_reason_lists_up_to_three() {
        let a = profile_with_interests(&["Gaming", "Music", "Art"]);
        let b = profile_with_interests(&["Art", "Music", "Gaming"]);

        let result = calculate_match_score(&a, &b, &[]);

        assert_eq!(result.score, 24);
        assert_eq!(result.reasons, vec!["Shared interests: Gaming, Music, Art"]);
    }

    #[test]
    fn test_interest_reason_summarises_beyond_three() {
        let a = profile_with_interests(&["Gaming", "Music", "Art", "Hiking"]);
        let b = profile_with_interests(&["Hiking", "Art", "Music", "Gaming"]);

        let result = calculate_match_score(&a, &b, &[]);

        assert_eq!(result.score, 32);
        assert_eq!(result.reasons, vec!["4 shared interests including Gaming, Music"]);
    }

    #[test]
    fn test_single_shared_class_is_singular() {
        let a = Profile::default();
        let b = Profile::default();

        let result = calculate_match_score(&a, &b, &tags(&["CSE231"]));

        assert_eq!(result.score, 12);
        assert_eq!(result.reasons, vec!["1 shared class"]);
    }

    #[test]
    fn test_major_reason_uses_candidate_spelling() {
        let a = Profile {
            major: Some("computer science".into()),
            ..Default::default()
        };
        let b = Profile {
            major: Some("Computer Science".into()),
            ..Default::default()
        };

        let result = calculate_match_score(&a, &b, &[]);

        assert_eq!(result.score, 15);
        assert_eq!(result.reasons, vec!["Same major: Computer Science"]);
    }

    #[test]
    fn test_empty_strings_never_match() {
        let a = Profile {
            major: Some(String::new()),
            campus_area: Some(String::new()),
            dorm: Some(String::new()),
            ..Default::default()
        };

        let result = calculate_match_score(&a, &a.clone(), &[]);

        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_everything_matching_caps_at_100() {
        let all = Profile {
            id: "x".into(),
            major: Some("CS".into()),
            year: Some(Year::Senior),
            interests: tags(&["a", "b", "c", "d", "e", "f"]),
            looking_for: tags(&["Friends", "Roommate"]),
            campus_area: Some("South".into()),
            dorm: Some("Holden".into()),
            ..Default::default()
        };

        let result = calculate_match_score(&all, &all.clone(), &tags(&["A", "B"]));

        assert_eq!(result.score, 100);
        assert_eq!(result.reasons.len(), 7);
        assert_eq!(result.reasons[6], "2 shared classes");
    }

    #[test]
    fn test_zero_weight_factor_adds_no_reason() {
        let weights = ScoringWeights {
            dorm: 0,
            ..Default::default()
        };
        let a = Profile {
            dorm: Some("Holden".into()),
            ..Default::default()
        };

        let result = calculate_weighted_match_score(&a, &a.clone(), &[], &weights);

        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }
}
