use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{AccessTokenRecord, FromSqliteRow, RefreshTokenRecord, TokenGrant};

#[derive(Clone)]
pub struct TokenRepository {
    pool: DbPool,
}

impl TokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_access(&self, user_id: &str) -> Result<Option<AccessTokenRecord>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM access_tokens WHERE user_id = ?")?;
            let result = stmt
                .query_row([&user_id], AccessTokenRecord::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn get_refresh(&self, user_id: &str) -> Result<Option<RefreshTokenRecord>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM refresh_tokens WHERE user_id = ?")?;
            let result = stmt
                .query_row([&user_id], RefreshTokenRecord::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Store a fresh grant, replacing both stored tokens in one transaction.
    /// Every grant carries a new refresh token, so the old one is always
    /// overwritten.
    pub async fn store_grant(&self, user_id: &str, grant: &TokenGrant) -> Result<()> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let grant = grant.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO refresh_tokens (user_id, refresh_token, updated_at) VALUES (?, ?, ?)",
                rusqlite::params![user_id, grant.refresh_token, now],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO access_tokens (user_id, access_token, expires_at, scope, updated_at) VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![user_id, grant.access_token, grant.expires_at, grant.scope, now],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
