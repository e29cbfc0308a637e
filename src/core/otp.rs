//! Passcode rules for email sign-in.
//!
//! Everything here is pure; storage and delivery live in `services`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Smallest and largest six-digit codes
const CODE_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

/// Host the auth provider sometimes bakes into magic links
const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// Who may request a code and how long it stays valid
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    allowed_domain: String,
    ttl: Duration,
}

impl OtpPolicy {
    pub fn new(allowed_domain: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            allowed_domain: allowed_domain.into(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Only addresses ending in `@<allowed_domain>` may sign in
    pub fn is_allowed_email(&self, email: &str) -> bool {
        email
            .strip_suffix(self.allowed_domain.as_str())
            .is_some_and(|local| local.ends_with('@'))
    }

    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.ttl
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new("msu.edu", 10)
    }
}

/// Generate a six-digit numeric code
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(CODE_RANGE).to_string()
}

/// Point a magic link at the caller's origin instead of the local dev host
pub fn rewrite_local_origin(link: &str, origin: &str) -> String {
    if link.contains(LOCAL_ORIGIN) {
        link.replace(LOCAL_ORIGIN, origin)
    } else {
        link.to_string()
    }
}
