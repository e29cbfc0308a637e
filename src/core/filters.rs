use crate::core::distance::{calculate_bounding_box, is_within_bounding_box, Coordinate};
use crate::models::{DiscoveryQuery, Profile, Year};

/// Check the year facet; no facet means every year passes
#[inline]
pub fn matches_year(profile: &Profile, year: Option<Year>) -> bool {
    match year {
        Some(wanted) => profile.year == Some(wanted),
        None => true,
    }
}

/// Check the interest facet: the profile must carry at least one of them
#[inline]
pub fn matches_interests(profile: &Profile, interests: &[String]) -> bool {
    interests.is_empty() || interests.iter().any(|i| profile.interests.contains(i))
}

/// Distance from the viewer to the profile, when both locations are valid
#[inline]
pub fn distance_between(viewer: Option<Coordinate>, profile: &Profile) -> Option<f64> {
    Some(viewer?.distance_to(&profile.coordinate()?))
}

/// Check the radius facet
///
/// A bounding box rejects far-away points before the Haversine check.
/// With a radius set, profiles without a usable location are dropped, and
/// so is everyone if the viewer has no usable location.
pub fn within_radius(
    viewer: Option<Coordinate>,
    profile: &Profile,
    max_distance_miles: Option<f64>,
) -> bool {
    let Some(radius) = max_distance_miles else {
        return true;
    };
    let (Some(origin), Some(point)) = (viewer, profile.coordinate()) else {
        return false;
    };

    let bbox = calculate_bounding_box(origin.lat(), origin.lon(), radius);
    if !is_within_bounding_box(point.lat(), point.lon(), &bbox) {
        return false;
    }

    origin.distance_to(&point) <= radius
}

/// Check if a profile is eligible for the discovery query
///
/// Excludes the viewer and anyone in `exclude_ids`, then applies the
/// year, interest and radius facets.
#[inline]
pub fn matches_discovery_query(
    profile: &Profile,
    query: &DiscoveryQuery,
    viewer_location: Option<Coordinate>,
) -> bool {
    if profile.id == query.viewer_id || query.exclude_ids.contains(&profile.id) {
        return false;
    }

    matches_year(profile, query.year)
        && matches_interests(profile, &query.interests)
        && within_radius(viewer_location, profile, query.max_distance_miles)
}
