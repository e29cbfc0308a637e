use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::core::otp::{generate_code, rewrite_local_origin};
use crate::models::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::routes::{error_response, AppState};

/// Configure passcode sign-in routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/send-otp", web::post().to(send_otp))
        .route("/auth/verify-otp", web::post().to(verify_otp));
}

/// Issue a passcode
///
/// POST /api/v1/auth/send-otp
///
/// Request body:
/// ```json
/// { "email": "sparty@msu.edu" }
/// ```
///
/// If the email cannot be delivered the code is returned as `devCode`.
async fn send_otp(
    state: web::Data<AppState>,
    req: web::Json<SendOtpRequest>,
) -> impl Responder {
    let policy = &state.otp_policy;
    if req.validate().is_err() || !policy.is_allowed_email(&req.email) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid email",
            format!("Valid @{} email required", policy.allowed_domain()),
        );
    }

    let email = req.into_inner().email;
    let now = chrono::Utc::now();
    let code = generate_code(&mut rand::thread_rng());

    if let Err(e) = state.otp_store.purge_expired(now).await {
        tracing::warn!("Failed to purge expired passcodes: {}", e);
    }

    if let Err(e) = state.otp_store.insert_otp(&email, &code, policy.expires_at(now)).await {
        tracing::error!("Failed to store passcode for {}: {}", email, e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue code", e.to_string());
    }

    match state.email.send_otp(&email, &code).await {
        Ok(()) => HttpResponse::Ok().json(SendOtpResponse {
            success: true,
            message: "Verification code sent to your email".to_string(),
            dev_code: None,
        }),
        Err(e) => {
            tracing::error!("Email sending failed for {}: {}", email, e);
            HttpResponse::Ok().json(SendOtpResponse {
                success: true,
                message: "Email delivery failed - use code below".to_string(),
                dev_code: Some(code),
            })
        }
    }
}

/// Exchange a passcode for a sign-in link
///
/// POST /api/v1/auth/verify-otp
///
/// Request body:
/// ```json
/// { "email": "sparty@msu.edu", "code": "123456" }
/// ```
async fn verify_otp(
    state: web::Data<AppState>,
    req: web::Json<VerifyOtpRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if req.validate().is_err() {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request", "Email and code required");
    }

    let VerifyOtpRequest { email, code } = req.into_inner();

    let record = match state.otp_store.find_valid_otp(&email, &code, chrono::Utc::now()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::info!("Rejected passcode for {}", email);
            return error_response(StatusCode::UNAUTHORIZED, "Unauthorized", "Invalid or expired code");
        }
        Err(e) => {
            tracing::error!("Failed to look up passcode for {}: {}", email, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed", e.to_string());
        }
    };

    if let Err(e) = state.otp_store.delete_otp(record.id).await {
        tracing::warn!("Failed to consume passcode {}: {}", record.id, e);
    }

    let existing = match state.supabase.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to look up account for {}: {}", email, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed", e.to_string());
        }
    };

    if existing.is_none() {
        if let Err(e) = state.supabase.create_user(&email).await {
            tracing::error!("Failed to create account for {}: {}", email, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed", e.to_string());
        }
    }

    let origin = request_origin(&http_req);
    let link = match state
        .supabase
        .generate_magic_link(&email, &format!("{}/discover", origin))
        .await
    {
        Ok(link) => link,
        Err(e) => {
            tracing::error!("Failed to generate sign-in link for {}: {}", email, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed", e.to_string());
        }
    };

    HttpResponse::Ok().json(VerifyOtpResponse {
        success: true,
        redirect_url: rewrite_local_origin(&link, &origin),
    })
}

/// Scheme and host the client used to reach us
fn request_origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}
