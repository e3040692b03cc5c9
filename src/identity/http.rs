//! HTTP implementation of the identity service.
//!
//! Talks to the HealthQuest backend:
//! - `GET /api/user-info/` for the identity + profile document
//! - `GET /api/coach/status/` for coach approval
//! - `POST /accounts/logout/` as the logout notification
//!
//! Requests carry the ambient cookie session; the cookie jar lives in the
//! underlying client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::traits::{CoachStatus, IdentityService, UserInfo};
use crate::error::{IdentityError, Result};
use crate::types::{CoachApproval, GamificationLevel, Identity, Profile, Role};

/// Configuration for the HTTP identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the platform backend.
    pub base_url: String,
    /// Request timeout in seconds. A fetch that exceeds this is treated
    /// like any other network failure.
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Identity service backed by the platform's HTTP API.
pub struct HttpIdentityService {
    config: IdentityConfig,
    client: Client,
}

impl HttpIdentityService {
    /// Create a new identity service.
    pub fn new(config: IdentityConfig) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status { status, message });
        }
        Ok(response.json().await?)
    }
}

/// `GET /api/user-info/` document.
#[derive(Debug, Deserialize)]
struct UserInfoWire {
    #[serde(rename = "isAuthenticated")]
    is_authenticated: bool,
    user: Option<UserWire>,
}

#[derive(Debug, Deserialize)]
struct UserWire {
    id: i64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    is_staff: bool,
    #[serde(default)]
    profile_complete: bool,
    #[serde(default)]
    profile: Option<ProfileWire>,
}

#[derive(Debug, Deserialize)]
struct ProfileWire {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    photo: Option<String>,
    #[serde(default)]
    current_level: Option<LevelWire>,
}

#[derive(Debug, Deserialize)]
struct LevelWire {
    #[serde(default)]
    level: String,
    #[serde(default)]
    level_rank: u32,
    #[serde(default)]
    xp: u32,
}

/// `GET /api/coach/status/` document. `coach` is null while no coach
/// record exists yet.
#[derive(Debug, Deserialize)]
struct CoachStatusWire {
    coach: Option<CoachWire>,
}

#[derive(Debug, Deserialize)]
struct CoachWire {
    #[serde(default)]
    status_approval: Option<String>,
}

impl From<UserWire> for UserInfo {
    fn from(user: UserWire) -> Self {
        let profile = user.profile.map(Profile::from);
        UserInfo {
            authenticated: true,
            identity: Some(Identity {
                id: user.id,
                username: user.username,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                is_admin: user.is_admin,
                is_staff: user.is_staff,
                profile_complete: user.profile_complete,
            }),
            profile,
        }
    }
}

impl From<ProfileWire> for Profile {
    fn from(profile: ProfileWire) -> Self {
        Profile {
            // the serializer emits an empty string while no role is set
            role: profile
                .role
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(Role::from_declared),
            height: profile.height,
            weight: profile.weight,
            age: profile.age,
            gender: profile.gender,
            location: profile.location,
            photo: profile.photo,
            current_level: profile.current_level.map(|l| GamificationLevel {
                level: l.level,
                rank: l.level_rank,
                xp: l.xp,
            }),
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn fetch_user_info(&self) -> Result<UserInfo> {
        let response = self.client.get(self.url("/api/user-info/")).send().await?;
        let wire: UserInfoWire = self.handle_response(response).await?;

        debug!(authenticated = wire.is_authenticated, "identity document fetched");

        Ok(match wire.user {
            Some(user) if wire.is_authenticated => user.into(),
            _ => UserInfo::default(),
        })
    }

    async fn fetch_coach_status(&self) -> Result<CoachStatus> {
        let response = self
            .client
            .get(self.url("/api/coach/status/"))
            .send()
            .await?;
        let wire: CoachStatusWire = self.handle_response(response).await?;

        let approval = wire
            .coach
            .and_then(|c| c.status_approval)
            .map(|s| CoachApproval::from_status(&s))
            .unwrap_or(CoachApproval::Unknown);

        Ok(CoachStatus { approval })
    }

    async fn notify_logout(&self) -> Result<()> {
        let response = self.client.post(self.url("/accounts/logout/")).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status { status, message });
        }

        Ok(())
    }
}
