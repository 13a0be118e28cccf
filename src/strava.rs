//! Strava integration: OAuth token exchange/refresh and activity import.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::config::StravaConfig;
use crate::error::AppError;
use crate::models::{TokenGrant, WorkoutFields};
use crate::repositories::TokenRepository;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const ACTIVITIES_PER_PAGE: u32 = 100;
const OAUTH_SCOPE: &str = "activity:read_all";

/// Errors from the provider token protocol. Callers must not retry a
/// rejected refresh: the stored refresh token may be permanently invalid.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no provider connection on file")]
    NotConnected,
    #[error("token exchange rejected: {0}")]
    ExchangeRejected(String),
    #[error("token refresh rejected: {0}")]
    RefreshRejected(String),
    #[error("activity fetch failed: {0}")]
    FetchRejected(String),
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Storage(#[from] AppError),
}

/// Summary activity from the provider's listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySummary {
    pub id: i64,
    pub name: String,
    pub sport_type: String,
    pub start_date_local: String,
    pub distance: f64,
    pub elapsed_time: i64,
}

impl ActivitySummary {
    /// Map a provider activity onto workout fields. Returns `None` when the
    /// activity's date cannot be parsed.
    pub fn to_workout_fields(&self) -> Option<WorkoutFields> {
        let date =
            NaiveDate::parse_from_str(self.start_date_local.get(..10)?, "%Y-%m-%d").ok()?;
        let distance_km = if self.distance > 0.0 {
            Some(self.distance / 1000.0)
        } else {
            None
        };
        Some(WorkoutFields {
            date,
            workout_type: Some(self.sport_type.clone()),
            title: Some(self.name.clone()),
            comments: None,
            completed_hours: self.elapsed_time as f64 / 3600.0,
            planned_hours: 0.0,
            distance_km,
        })
    }
}

/// Low-level HTTP client for the provider's OAuth and activity endpoints.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    config: StravaConfig,
}

impl StravaClient {
    pub fn new(config: StravaConfig) -> crate::error::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// URL the browser is sent to for the provider's consent screen.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&approval_prompt=auto&scope={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
        )
    }

    /// Exchange an authorization code for a token grant.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, TokenError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| TokenError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::ExchangeRejected(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| TokenError::ExchangeRejected(format!("invalid token payload: {e}")))
    }

    /// Trade a refresh token for a new grant.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, TokenError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| TokenError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::RefreshRejected(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| TokenError::RefreshRejected(format!("invalid token payload: {e}")))
    }

    /// List the athlete's recent activities.
    pub async fn list_activities(
        &self,
        access_token: &str,
    ) -> Result<Vec<ActivitySummary>, TokenError> {
        let url = format!("{}/athlete/activities", self.config.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("per_page", ACTIVITIES_PER_PAGE.to_string())])
            .send()
            .await
            .map_err(|e| TokenError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::FetchRejected(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| TokenError::FetchRejected(format!("invalid activity payload: {e}")))
    }
}

/// Token lifecycle on top of the client and the stored tokens.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    tokens: TokenRepository,
}

impl StravaService {
    pub fn new(client: StravaClient, tokens: TokenRepository) -> Self {
        Self { client, tokens }
    }

    pub fn authorize_url(&self) -> String {
        self.client.authorize_url()
    }

    /// Complete the OAuth callback: exchange the code and persist the grant.
    pub async fn connect(&self, user_id: &str, code: &str) -> Result<(), TokenError> {
        let grant = self.client.exchange_code(code).await?;
        self.tokens.store_grant(user_id, &grant).await?;
        tracing::info!(user_id, "provider connection established");
        Ok(())
    }

    /// Return a usable access token for the user.
    ///
    /// A stored token that has not reached its expiry is returned unchanged
    /// without touching the network. An expired token triggers exactly one
    /// renewal attempt; the renewed grant replaces both stored tokens before
    /// the new access token is returned.
    pub async fn get_valid_token(&self, user_id: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        if let Some(record) = self.tokens.get_access(user_id).await? {
            if !record.is_expired(now) {
                return Ok(record.access_token);
            }
        }

        let Some(refresh) = self.tokens.get_refresh(user_id).await? else {
            return Err(TokenError::NotConnected);
        };

        tracing::info!(user_id, "access token expired, refreshing");
        let grant = self.client.refresh(&refresh.refresh_token).await?;
        self.tokens.store_grant(user_id, &grant).await?;
        Ok(grant.access_token)
    }

    /// Fetch the user's recent activities with a valid token.
    pub async fn fetch_activities(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivitySummary>, TokenError> {
        let access_token = self.get_valid_token(user_id).await?;
        self.client.list_activities(&access_token).await
    }
}
