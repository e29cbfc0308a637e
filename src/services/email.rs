use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors from the transactional email API
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Email API error: {0}")]
    ApiError(String),
}

/// Sends passcode emails through an HTTP email API
pub struct EmailSender {
    api_url: String,
    api_key: Option<String>,
    from_address: String,
    ttl_minutes: i64,
    client: Client,
}

impl EmailSender {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        from_address: String,
    ) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            from_address,
            ttl_minutes: 10,
            client,
        })
    }

    /// Lifetime quoted in the email body
    pub fn with_ttl_minutes(mut self, ttl_minutes: i64) -> Self {
        self.ttl_minutes = ttl_minutes;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a verification code
    pub async fn send_otp(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Email API key is not configured");
            return Err(EmailError::NotConfigured);
        };

        let payload = json!({
            "from": self.from_address,
            "to": to,
            "subject": "Your SpartanFinder Verification Code",
            "html": otp_email_html(code, self.ttl_minutes),
        });

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            tracing::error!("Email API error ({}): {}", status, body);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Failed to send email")
                .to_string();
            return Err(EmailError::ApiError(message));
        }

        tracing::debug!("Sent passcode email to {}", to);
        Ok(())
    }
}

fn otp_email_html(code: &str, ttl_minutes: i64) -> String {
    format!(
        "<div style=\"font-family:sans-serif;text-align:center\">\
         <h2>Your verification code</h2>\
         <p style=\"font-size:32px;letter-spacing:8px;font-weight:bold\">{}</p>\
         <p>This code expires in {} minutes.</p>\
         </div>",
        code, ttl_minutes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_unconfigured() {
        let sender = EmailSender::new(
            "https://api.email.test/".to_string(),
            Some(String::new()),
            "SpartanFinder <noreply@test>".to_string(),
        )
        .unwrap();

        assert!(!sender.is_configured());
        assert_eq!(sender.api_url, "https://api.email.test");
    }

    #[test]
    fn test_email_body_contains_code() {
        let html = otp_email_html("123456", 15);
        assert!(html.contains("123456"));
        assert!(html.contains("15 minutes"));
    }
}
