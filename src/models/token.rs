use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::Deserialize;

use super::FromSqliteRow;

/// Stored access token for a user's provider connection.
///
/// `expires_at` is an epoch timestamp in seconds, compared directly against
/// the current time when deciding whether a refresh is needed.
#[derive(Debug, Clone)]
pub struct AccessTokenRecord {
    pub user_id: String,
    pub access_token: String,
    pub expires_at: i64,
    pub scope: String,
    pub updated_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

impl FromSqliteRow for AccessTokenRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            access_token: row.get("access_token")?,
            expires_at: row.get("expires_at")?,
            scope: row.get("scope")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub user_id: String,
    pub refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for RefreshTokenRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            refresh_token: row.get("refresh_token")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Token payload returned by the provider on both the initial exchange and
/// every refresh. Each grant carries a new refresh token that replaces the
/// stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    #[serde(default)]
    pub scope: String,
}
