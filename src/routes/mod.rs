// Route exports
pub mod auth;
pub mod matches;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::core::{Matcher, OtpPolicy};
use crate::models::ErrorResponse;
use crate::services::{EmailSender, OtpStore, SupabaseClient, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
    pub otp_store: Arc<dyn OtpStore>,
    pub email: Arc<EmailSender>,
    pub tokens: Arc<TokenVerifier>,
    pub matcher: Matcher,
    pub otp_policy: OtpPolicy,
    pub discovery: DiscoverySettings,
}

/// Candidate pool and limits for discovery requests
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub candidate_pool: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub semester: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(auth::configure),
    );
}

pub(crate) fn error_response(
    status: actix_web::http::StatusCode,
    error: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}
