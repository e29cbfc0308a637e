use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::core::DiscoveryContext;
use crate::models::{DiscoveryQuery, FindMatchesRequest, FindMatchesResponse, HealthResponse, ScoreRequest};
use crate::routes::{error_response, AppState};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/score", web::post().to(score_pair));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.otp_store.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score two supplied profiles
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "viewer": { "id": "a", "interests": ["Gaming"] },
///   "candidate": { "id": "b", "interests": ["Gaming", "Art"] },
///   "sharedClasses": ["CSE231"]
/// }
/// ```
///
/// Scores with the same weights as `/matches/find`.
async fn score_pair(state: web::Data<AppState>, req: web::Json<ScoreRequest>) -> impl Responder {
    let req = req.into_inner();
    let result = state.matcher.score(&req.viewer, &req.candidate, &req.shared_classes);
    HttpResponse::Ok().json(result)
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Requires `Authorization: Bearer <access token>`; the token's subject is
/// the viewer.
///
/// Request body:
/// ```json
/// {
///   "limit": 20,
///   "year": "Junior",
///   "interests": ["Gaming"],
///   "maxDistanceMiles": 2.5
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let auth_header = http_req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = match state.tokens.verify_header(auth_header) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!("Rejected find_matches request: {}", e);
            return error_response(StatusCode::UNAUTHORIZED, "Unauthorized", e.to_string());
        }
    };

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: field_errors={:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let user_id = claims.sub;
    let settings = &state.discovery;
    let limit = req
        .limit
        .map(usize::from)
        .unwrap_or(settings.default_limit)
        .min(settings.max_limit);

    tracing::info!("Finding matches for user: {}, limit: {}", user_id, limit);

    let viewer = match state.supabase.get_profile(&user_id).await {
        Ok(profile) => profile,
        Err(crate::services::SupabaseError::NotFound(message)) => {
            return error_response(StatusCode::NOT_FOUND, "Profile not found", message);
        }
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user profile", e.to_string());
        }
    };

    let candidates = match state.supabase.list_profiles(&user_id, settings.candidate_pool).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to query candidates for {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to query candidates", e.to_string());
        }
    };

    let friend_ids = match state.supabase.get_friend_ids(&user_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to fetch friendships for {}: {}", user_id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch friendships", e.to_string());
        }
    };

    // Request badges and shared classes only enrich cards; degrade without them
    let friend_requests = state
        .supabase
        .get_friend_requests(&user_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch friend requests for {}, proceeding without: {}", user_id, e);
            vec![]
        });

    let mut class_owners: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
    class_owners.push(user_id.clone());
    let mut enrolments = state
        .supabase
        .get_class_ids(&class_owners, &settings.semester)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch class enrolments for {}, proceeding without: {}", user_id, e);
            Default::default()
        });

    let context = DiscoveryContext {
        friend_requests,
        viewer_classes: enrolments.remove(&user_id).unwrap_or_default(),
        candidate_classes: enrolments,
    };

    let req = req.into_inner();
    let query = DiscoveryQuery {
        viewer_id: user_id.clone(),
        exclude_ids: friend_ids,
        year: req.year,
        interests: req.interests,
        max_distance_miles: req.max_distance_miles,
        limit,
    };

    tracing::debug!("Ranking {} candidates for {} ({} excluded)", candidates.len(), user_id, query.exclude_ids.len());

    let result = state.matcher.rank(&viewer, candidates, &context, &query);

    let response = FindMatchesResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    };

    tracing::info!(
        "Returning {} matches for user {} (from {} candidates)",
        response.matches.len(),
        user_id,
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}
