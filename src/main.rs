use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use spartan_match::config::{LoggingSettings, Settings};
use spartan_match::core::{Matcher, OtpPolicy};
use spartan_match::models::ScoringWeights;
use spartan_match::routes::{self, AppState, DiscoverySettings};
use spartan_match::services::{EmailSender, PostgresClient, SupabaseClient, TokenVerifier};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// `RUST_LOG` wins over the configured level when set
fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, e);
    std::io::Error::other(format!("{}: {}", what, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    init_logging(&settings.logging);

    info!("Starting Spartan Match service...");

    let supabase = Arc::new(
        SupabaseClient::new(settings.supabase.url.clone(), settings.supabase.service_role_key.clone())
            .map_err(|e| startup_error("Failed to build database client", e))?,
    );

    info!("Database client initialized for {}", supabase.base_url());

    let tokens = Arc::new(
        TokenVerifier::new(&settings.supabase.jwt_secret)
            .map_err(|e| startup_error("Failed to configure token verification", e))?,
    );

    let otp_store = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL passcode store initialized");

    let email = Arc::new(
        EmailSender::new(
            settings.email.api_url.clone(),
            settings.email.api_key.clone(),
            settings.email.from_address.clone(),
        )
        .map_err(|e| startup_error("Failed to build email client", e))?
        .with_ttl_minutes(settings.otp.ttl_minutes),
    );

    if !email.is_configured() {
        tracing::warn!("No email API key configured; passcodes will be returned in responses");
    }

    let weights = ScoringWeights::from(&settings.scoring.weights);
    let matcher = Matcher::new(weights);

    info!("Matcher initialized with weights: {:?}", weights);

    let app_state = AppState {
        supabase,
        otp_store,
        email,
        tokens,
        matcher,
        otp_policy: OtpPolicy::new(settings.otp.allowed_domain.clone(), settings.otp.ttl_minutes),
        discovery: DiscoverySettings {
            candidate_pool: settings.matching.candidate_pool,
            default_limit: settings.matching.default_limit,
            max_limit: settings.matching.max_limit,
            semester: settings.matching.semester.clone(),
        },
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
