// HTTP handler tests with an in-memory passcode store and a mock auth/email API

use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockito::Matcher as Query;
use serde_json::{json, Value};
use uuid::Uuid;

use spartan_match::core::{Matcher, OtpPolicy};
use spartan_match::models::{OtpRecord, ScoringWeights};
use spartan_match::routes::{configure_routes, AppState, DiscoverySettings};
use spartan_match::services::{
    EmailSender, OtpStore, PostgresError, SupabaseClient, TokenVerifier,
};

const UNREACHABLE: &str = "http://127.0.0.1:9";

#[derive(Default)]
struct MemoryOtpStore {
    records: Mutex<Vec<OtpRecord>>,
}

impl MemoryOtpStore {
    fn with_code(email: &str, code: &str, expires_at: DateTime<Utc>) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().push(OtpRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            created_at: Utc::now(),
        });
        store
    }

    fn codes_for(&self, email: &str) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.email == email)
            .map(|r| r.code.clone())
            .collect()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn insert_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid, PostgresError> {
        let id = Uuid::new_v4();
        self.records.lock().unwrap().push(OtpRecord {
            id,
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_valid_otp(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, PostgresError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.email == email && r.code == code && r.expires_at > now)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn delete_otp(&self, id: Uuid) -> Result<bool, PostgresError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, PostgresError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.expires_at > now);
        Ok((before - records.len()) as u64)
    }

    async fn health_check(&self) -> Result<bool, PostgresError> {
        Ok(true)
    }
}

fn app_state(
    api_url: &str,
    email_key: Option<&str>,
    store: Arc<MemoryOtpStore>,
    matcher: Matcher,
) -> AppState {
    AppState {
        supabase: Arc::new(SupabaseClient::new(api_url.to_string(), "service_key".to_string()).unwrap()),
        otp_store: store,
        email: Arc::new(
            EmailSender::new(
                api_url.to_string(),
                email_key.map(str::to_string),
                "SpartanFinder <noreply@test>".to_string(),
            )
            .unwrap(),
        ),
        tokens: Arc::new(TokenVerifier::new("test-jwt-secret").unwrap()),
        matcher,
        otp_policy: OtpPolicy::default(),
        discovery: DiscoverySettings {
            candidate_pool: 50,
            default_limit: 20,
            max_limit: 100,
            semester: "Spring 2025".to_string(),
        },
    }
}

fn verify_request(email: &str, code: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/auth/verify-otp")
        .insert_header(("host", "spartanfinder.app"))
        .set_json(json!({ "email": email, "code": code }))
}

#[actix_web::test]
async fn test_send_otp_rejects_other_domains() {
    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(UNREACHABLE, None, store.clone(), Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-otp")
        .set_json(json!({ "email": "sparty@umich.edu" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Valid @msu.edu email required");
    assert!(store.codes_for("sparty@umich.edu").is_empty());
}

#[actix_web::test]
async fn test_send_otp_returns_code_when_email_fails() {
    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(UNREACHABLE, None, store.clone(), Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-otp")
        .set_json(json!({ "email": "sparty@msu.edu" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email delivery failed - use code below");
    let code = body["devCode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(store.codes_for("sparty@msu.edu"), vec![code]);
}

#[actix_web::test]
async fn test_send_otp_emails_code() {
    let mut server = mockito::Server::new_async().await;
    let email = server
        .mock("POST", "/emails")
        .match_body(Query::PartialJson(json!({ "to": "sparty@msu.edu" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "email-1" }).to_string())
        .create_async()
        .await;

    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(&server.url(), Some("re_test"), store.clone(), Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-otp")
        .set_json(json!({ "email": "sparty@msu.edu" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["message"], "Verification code sent to your email");
    assert!(body.get("devCode").is_none());
    assert_eq!(store.codes_for("sparty@msu.edu").len(), 1);
    email.assert_async().await;
}

#[actix_web::test]
async fn test_verify_otp_rejects_unknown_and_expired_codes() {
    let expired = Utc::now() - Duration::minutes(1);
    let store = Arc::new(MemoryOtpStore::with_code("sparty@msu.edu", "123456", expired));
    let state = app_state(UNREACHABLE, None, store, Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    for code in ["123456", "654321"] {
        let resp = test::call_service(&app, verify_request("sparty@msu.edu", code).to_request()).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid or expired code");
    }
}

#[actix_web::test]
async fn test_verify_otp_signs_in_existing_user() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/auth/v1/admin/users")
        .match_query(Query::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "users": [{ "id": "u1", "email": "sparty@msu.edu" }] }).to_string())
        .create_async()
        .await;
    let create = server
        .mock("POST", "/auth/v1/admin/users")
        .expect(0)
        .create_async()
        .await;
    let link = server
        .mock("POST", "/auth/v1/admin/generate_link")
        .match_body(Query::PartialJson(json!({
            "email": "sparty@msu.edu",
            "redirect_to": "http://spartanfinder.app/discover"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "action_link": "http://localhost:3000/auth/v1/verify?token=abc&redirect_to=http://localhost:3000/discover"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let expires = Utc::now() + Duration::minutes(10);
    let store = Arc::new(MemoryOtpStore::with_code("sparty@msu.edu", "123456", expires));
    let state = app_state(&server.url(), None, store.clone(), Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let body: Value =
        test::call_and_read_body_json(&app, verify_request("sparty@msu.edu", "123456").to_request()).await;

    assert_eq!(body["success"], true);
    assert_eq!(
        body["redirectUrl"],
        "http://spartanfinder.app/auth/v1/verify?token=abc&redirect_to=http://spartanfinder.app/discover"
    );
    assert!(store.codes_for("sparty@msu.edu").is_empty());
    create.assert_async().await;
    link.assert_async().await;

    // A code works once
    let resp = test::call_service(&app, verify_request("sparty@msu.edu", "123456").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_verify_otp_creates_missing_user() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/auth/v1/admin/users")
        .match_query(Query::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "users": [] }).to_string())
        .create_async()
        .await;
    let create = server
        .mock("POST", "/auth/v1/admin/users")
        .match_body(Query::PartialJson(json!({
            "email": "freshman@msu.edu",
            "email_confirm": true,
            "user_metadata": { "onboarding_complete": false }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "new-user", "email": "freshman@msu.edu" }).to_string())
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/auth/v1/admin/generate_link")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "action_link": "https://auth.test/verify?token=xyz" }).to_string())
        .create_async()
        .await;

    let expires = Utc::now() + Duration::minutes(10);
    let store = Arc::new(MemoryOtpStore::with_code("freshman@msu.edu", "111111", expires));
    let state = app_state(&server.url(), None, store, Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let body: Value =
        test::call_and_read_body_json(&app, verify_request("freshman@msu.edu", "111111").to_request()).await;

    assert_eq!(body["redirectUrl"], "https://auth.test/verify?token=xyz");
    create.assert_async().await;
}

#[actix_web::test]
async fn test_score_endpoint_uses_configured_weights() {
    let weights = ScoringWeights {
        major: 50,
        ..Default::default()
    };
    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(UNREACHABLE, None, store, Matcher::new(weights));
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/score")
        .set_json(json!({
            "viewer": { "id": "a", "major": "CS" },
            "candidate": { "id": "b", "major": "cs" }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["score"], 50);
    assert_eq!(body["reasons"], json!(["Same major: cs"]));
}

#[actix_web::test]
async fn test_score_endpoint_default_weights() {
    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(UNREACHABLE, None, store, Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/score")
        .set_json(json!({
            "viewer": { "id": "a", "interests": ["Gaming", "Music"], "major": "CS", "year": "Junior" },
            "candidate": { "id": "b", "interests": ["Gaming", "Music", "Art"], "major": "cs", "year": "Junior" }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["score"], 41);
    assert_eq!(body["reasons"].as_array().map(Vec::len), Some(3));
}

#[actix_web::test]
async fn test_find_matches_requires_token() {
    let store = Arc::new(MemoryOtpStore::default());
    let state = app_state(UNREACHABLE, None, store, Matcher::default());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/find")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
