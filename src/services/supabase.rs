use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{AuthUser, FriendRequest, Profile};

/// Errors that can occur when talking to the hosted database or auth admin API
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the hosted backend
///
/// Handles:
/// - Profile, friendship and class-enrolment reads over the REST interface
/// - Account lookup, provisioning and magic links over the auth admin API
///
/// Every request authenticates with the service-role key.
pub struct SupabaseClient {
    base_url: String,
    service_role_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct FriendshipRow {
    user_a: String,
    user_b: String,
}

#[derive(Deserialize)]
struct EnrolmentRow {
    user_id: String,
    class_id: String,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<AuthUser>,
}

impl SupabaseClient {
    /// Create a new client
    pub fn new(base_url: String, service_role_key: String) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, query)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn check(response: Response, action: &str) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Failed to {}: {} - {}", action, status, body);
        Err(SupabaseError::ApiError(format!("Failed to {}: {}", action, status)))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        action: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = self.rest_url(table, query);
        tracing::debug!("Querying {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, action).await?;

        response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", table, e)))
    }

    /// Get a single profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, SupabaseError> {
        let query = format!("select=*&id=eq.{}", urlencoding::encode(user_id));

        let mut rows: Vec<Profile> = self.select("profiles", &query, "fetch profile").await?;
        if rows.is_empty() {
            return Err(SupabaseError::NotFound(format!("Profile not found for user {}", user_id)));
        }
        Ok(rows.swap_remove(0))
    }

    /// Most recently updated profiles other than `exclude_id`
    pub async fn list_profiles(
        &self,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, SupabaseError> {
        let query = format!(
            "select=*&id=neq.{}&order=updated_at.desc&limit={}",
            urlencoding::encode(exclude_id),
            limit
        );

        let profiles: Vec<Profile> = self.select("profiles", &query, "list profiles").await?;
        tracing::debug!("Fetched {} candidate profiles", profiles.len());
        Ok(profiles)
    }

    /// Ids of everyone the user is friends with, from either side of the pair
    pub async fn get_friend_ids(&self, user_id: &str) -> Result<HashSet<String>, SupabaseError> {
        let id = urlencoding::encode(user_id);
        let query = format!("select=user_a,user_b&or=(user_a.eq.{id},user_b.eq.{id})");

        let rows: Vec<FriendshipRow> = self.select("friendships", &query, "fetch friendships").await?;

        Ok(rows
            .into_iter()
            .map(|row| if row.user_a == user_id { row.user_b } else { row.user_a })
            .collect())
    }

    /// Friend requests the user sent or received
    pub async fn get_friend_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>, SupabaseError> {
        let id = urlencoding::encode(user_id);
        let query = format!("select=id,from_user,to_user,status&or=(from_user.eq.{id},to_user.eq.{id})");

        self.select("friend_requests", &query, "fetch friend requests").await
    }

    /// Class ids per user for one semester
    ///
    /// Users with no enrolments are absent from the map.
    pub async fn get_class_ids(
        &self,
        user_ids: &[String],
        semester: &str,
    ) -> Result<HashMap<String, Vec<String>>, SupabaseError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = user_ids
            .iter()
            .map(|id| format!("\"{}\"", id.replace('"', "")))
            .collect::<Vec<_>>()
            .join(",");
        let query = format!(
            "select=user_id,class_id&semester=eq.{}&user_id=in.({})",
            urlencoding::encode(semester),
            urlencoding::encode(&ids)
        );

        let rows: Vec<EnrolmentRow> = self.select("user_classes", &query, "fetch class enrolments").await?;

        let mut by_user: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            by_user.entry(row.user_id).or_default().push(row.class_id);
        }
        Ok(by_user)
    }

    /// Find an auth account by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "list users").await?;

        let list: UserList = response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse users: {}", e)))?;

        Ok(list
            .users
            .into_iter()
            .find(|u| u.email.as_deref() == Some(email)))
    }

    /// Create a confirmed account that still has to finish onboarding
    pub async fn create_user(&self, email: &str) -> Result<AuthUser, SupabaseError> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);
        let payload = json!({
            "email": email,
            "email_confirm": true,
            "user_metadata": { "onboarding_complete": false },
        });

        let response = self.authorized(self.client.post(&url)).json(&payload).send().await?;
        let response = Self::check(response, "create user").await?;

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse user: {}", e)))?;

        tracing::info!("Provisioned account {} for {}", user.id, email);
        Ok(user)
    }

    /// Generate a one-time sign-in link
    pub async fn generate_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<String, SupabaseError> {
        let url = format!("{}/auth/v1/admin/generate_link", self.base_url);
        let payload = json!({
            "type": "magiclink",
            "email": email,
            "redirect_to": redirect_to,
        });

        let response = self.authorized(self.client.post(&url)).json(&payload).send().await?;
        let response = Self::check(response, "generate magic link").await?;

        let json: Value = response.json().await?;

        // The link sits at the top level or under `properties`, depending on version
        json.get("action_link")
            .or_else(|| json.get("properties").and_then(|p| p.get("action_link")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SupabaseError::InvalidResponse("Missing action_link".into()))
    }
}
