use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub otp: OtpSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: None,
            from_address: default_from_address(),
        }
    }
}

fn default_email_api_url() -> String { "https://api.resend.com".to_string() }
fn default_from_address() -> String { "SpartanFinder <onboarding@resend.dev>".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct OtpSettings {
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            allowed_domain: default_allowed_domain(),
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

fn default_allowed_domain() -> String { "msu.edu".to_string() }
fn default_ttl_minutes() -> i64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_semester")]
    pub semester: String,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            candidate_pool: default_candidate_pool(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            semester: default_semester(),
        }
    }
}

fn default_candidate_pool() -> usize { 50 }
fn default_limit() -> usize { 20 }
fn default_max_limit() -> usize { 100 }
fn default_semester() -> String { "Spring 2025".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_points")]
    pub interest_points: u32,
    #[serde(default = "default_interest_cap")]
    pub interest_cap: u32,
    #[serde(default = "default_major_weight")]
    pub major: u32,
    #[serde(default = "default_year_weight")]
    pub year: u32,
    #[serde(default = "default_looking_for_points")]
    pub looking_for_points: u32,
    #[serde(default = "default_looking_for_cap")]
    pub looking_for_cap: u32,
    #[serde(default = "default_campus_area_weight")]
    pub campus_area: u32,
    #[serde(default = "default_dorm_weight")]
    pub dorm: u32,
    #[serde(default = "default_class_points")]
    pub class_points: u32,
    #[serde(default = "default_class_cap")]
    pub class_cap: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interest_points: default_interest_points(),
            interest_cap: default_interest_cap(),
            major: default_major_weight(),
            year: default_year_weight(),
            looking_for_points: default_looking_for_points(),
            looking_for_cap: default_looking_for_cap(),
            campus_area: default_campus_area_weight(),
            dorm: default_dorm_weight(),
            class_points: default_class_points(),
            class_cap: default_class_cap(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(w: &WeightsConfig) -> Self {
        Self {
            interest_points: w.interest_points,
            interest_cap: w.interest_cap,
            major: w.major,
            year: w.year,
            looking_for_points: w.looking_for_points,
            looking_for_cap: w.looking_for_cap,
            campus_area: w.campus_area,
            dorm: w.dorm,
            class_points: w.class_points,
            class_cap: w.class_cap,
        }
    }
}

fn default_interest_points() -> u32 { 8 }
fn default_interest_cap() -> u32 { 40 }
fn default_major_weight() -> u32 { 15 }
fn default_year_weight() -> u32 { 10 }
fn default_looking_for_points() -> u32 { 8 }
fn default_looking_for_cap() -> u32 { 16 }
fn default_campus_area_weight() -> u32 { 5 }
fn default_dorm_weight() -> u32 { 10 }
fn default_class_points() -> u32 { 12 }
fn default_class_cap() -> u32 { 24 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SPARTAN__)
    /// 5. Well-known secret variables (DATABASE_URL, SUPABASE_URL, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let files = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        Self::layer_environment(files, |name| std::env::var(name).ok())
    }

    /// Load configuration from a custom path
    ///
    /// Environment variables and secrets are layered on top as in [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let files = Config::builder().add_source(File::from(path.as_ref()));

        Self::layer_environment(files, |name| std::env::var(name).ok())
    }

    fn layer_environment<F>(
        files: ConfigBuilder<DefaultState>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = files
            // e.g., SPARTAN__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SPARTAN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_secret_overrides(settings, lookup)?.try_deserialize()
    }
}

/// Environment variables the hosting platform sets, mapped to config keys
const SECRET_OVERRIDES: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("SUPABASE_URL", "supabase.url"),
    ("NEXT_PUBLIC_SUPABASE_URL", "supabase.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "supabase.service_role_key"),
    ("SUPABASE_JWT_SECRET", "supabase.jwt_secret"),
    ("RESEND_API_KEY", "email.api_key"),
    ("RESEND_FROM_EMAIL", "email.from_address"),
];

/// Layer well-known secret variables over the loaded config
///
/// The first variable found for a key wins.
fn apply_secret_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);
    let mut applied: Vec<&str> = Vec::new();

    for &(var, key) in SECRET_OVERRIDES {
        if applied.contains(&key) {
            continue;
        }
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
            applied.push(key);
        }
    }

    builder.build()
}
