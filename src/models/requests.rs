use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Profile, Year};

/// Request to rank discovery candidates for the authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u16>,
    #[serde(default)]
    pub year: Option<Year>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default, alias = "max_distance_miles", rename = "maxDistanceMiles")]
    #[validate(range(min = 0.0))]
    pub max_distance_miles: Option<f64>,
}

/// Request to score two supplied profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub viewer: Profile,
    pub candidate: Profile,
    #[serde(default, alias = "shared_classes", rename = "sharedClasses")]
    pub shared_classes: Vec<String>,
}

/// Request a one-time passcode by email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
}

/// Exchange an emailed passcode for a sign-in link
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub code: String,
}
