use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::core::distance::Coordinate;

/// Academic year of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Year {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Grad,
    Other,
}

impl Year {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Year::Freshman => "Freshman",
            Year::Sophomore => "Sophomore",
            Year::Junior => "Junior",
            Year::Senior => "Senior",
            Year::Grad => "Grad",
            Year::Other => "Other",
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Student profile as stored in the `profiles` table
///
/// Only `id` is required. Missing arrays decode as empty and missing
/// scalars as `None`, so partial rows are accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub year: Option<Year>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub interests: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub looking_for: Vec<String>,
    #[serde(default)]
    pub campus_area: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub dorm: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Profile {
    pub fn major(&self) -> Option<&str> {
        non_empty(self.major.as_deref())
    }

    pub fn campus_area(&self) -> Option<&str> {
        non_empty(self.campus_area.as_deref())
    }

    pub fn dorm(&self) -> Option<&str> {
        non_empty(self.dorm.as_deref())
    }

    /// Validated location, if both coordinates are present and in range
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// Empty strings count as absent, the same as a missing column
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of scoring one candidate against the viewer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Compatibility in `0..=100`
    pub score: u8,
    /// One entry per factor that fired, in evaluation order
    pub reasons: Vec<String>,
}

impl MatchResult {
    /// The first `n` reasons, for compact cards
    pub fn top_reasons(&self, n: usize) -> &[String] {
        &self.reasons[..n.min(self.reasons.len())]
    }
}

/// Display band for a match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    High,
    Medium,
    Low,
}

impl MatchTier {
    pub const fn from_score(score: u8) -> Self {
        if score >= 60 {
            MatchTier::High
        } else if score >= 30 {
            MatchTier::Medium
        } else {
            MatchTier::Low
        }
    }
}

/// Status of a row in `friend_requests`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: String,
    pub from_user: String,
    pub to_user: String,
    pub status: FriendRequestStatus,
}

/// Pending request state between the viewer and a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// The viewer sent a request that is still pending
    Sent,
    /// The candidate sent the viewer a request that is still pending
    Pending,
}

/// Ranked discovery entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredProfile {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
    pub tier: MatchTier,
    #[serde(rename = "requestStatus")]
    pub request_status: Option<RequestStatus>,
    #[serde(rename = "distanceMiles", skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

/// Geospatial bounding box in degrees
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Facets and exclusions for a discovery request
#[derive(Debug, Clone, Default)]
pub struct DiscoveryQuery {
    pub viewer_id: String,
    pub exclude_ids: HashSet<String>,
    pub year: Option<Year>,
    pub interests: Vec<String>,
    pub max_distance_miles: Option<f64>,
    pub limit: usize,
}

/// Points awarded per factor
///
/// `*_points` are per shared item and `*_cap` bounds that factor's total.
/// The remaining fields are flat awards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub interest_points: u32,
    pub interest_cap: u32,
    pub major: u32,
    pub year: u32,
    pub looking_for_points: u32,
    pub looking_for_cap: u32,
    pub campus_area: u32,
    pub dorm: u32,
    pub class_points: u32,
    pub class_cap: u32,
}

impl ScoringWeights {
    /// Highest raw sum before the global cap
    pub const fn max_raw(&self) -> u32 {
        self.interest_cap
            + self.major
            + self.year
            + self.looking_for_cap
            + self.campus_area
            + self.dorm
            + self.class_cap
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interest_points: 8,
            interest_cap: 40,
            major: 15,
            year: 10,
            looking_for_points: 8,
            looking_for_cap: 16,
            campus_area: 5,
            dorm: 10,
            class_points: 12,
            class_cap: 24,
        }
    }
}

/// Stored one-time passcode
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: uuid::Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// User as returned by the auth admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}
