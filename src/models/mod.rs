// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AuthUser, BoundingBox, DiscoveryQuery, FriendRequest, FriendRequestStatus, MatchResult,
    MatchTier, OtpRecord, Profile, RequestStatus, ScoredProfile, ScoringWeights, Year,
};
pub use requests::{FindMatchesRequest, ScoreRequest, SendOtpRequest, VerifyOtpRequest};
pub use responses::{
    ErrorResponse, FindMatchesResponse, HealthResponse, SendOtpResponse, VerifyOtpResponse,
};
