use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, User, UserRole};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([&id], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let username = username.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?")?;
            let result = stmt.query_row([&username], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// All athlete accounts, most recent class years first.
    pub async fn list_athletes(&self) -> Result<Vec<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM users WHERE coach = 0 ORDER BY graduation_year DESC, username ASC",
            )?;
            let users = stmt
                .query_map([], User::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        planned_hours: Option<f64>,
        graduation_year: Option<i32>,
    ) -> Result<User> {
        let password_hash = hash_password(password)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let username = username.to_string();

        let pool = self.pool.clone();
        let user = User {
            id: id.clone(),
            username: username.clone(),
            password_hash,
            role,
            planned_hours,
            graduation_year,
            created_at: now,
        };
        let user_clone = user.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO users (id, username, password_hash, coach, planned_hours, graduation_year, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user_clone.id,
                    user_clone.username,
                    user_clone.password_hash,
                    user_clone.role.as_flag(),
                    user_clone.planned_hours,
                    user_clone.graduation_year,
                    user_clone.created_at
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    AppError::UsernameTaken
                }
                other => AppError::Database(other),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(user)
    }

    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = self.find_by_username(username).await?;

        match user {
            Some(user) => {
                if verify_password(password, &user.password_hash)? {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Update an athlete's credentials and training plan fields. The stored
    /// password hash is kept when `new_password` is absent.
    pub async fn update_account(
        &self,
        id: &str,
        username: &str,
        new_password: Option<&str>,
        planned_hours: Option<f64>,
        graduation_year: Option<i32>,
    ) -> Result<bool> {
        let password_hash = match new_password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        let pool = self.pool.clone();
        let id = id.to_string();
        let username = username.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn
                .execute(
                    "UPDATE users SET username = ?, password_hash = COALESCE(?, password_hash), \
                     planned_hours = ?, graduation_year = ? WHERE id = ?",
                    rusqlite::params![username, password_hash, planned_hours, graduation_year, id],
                )
                .map_err(|e| match e {
                    rusqlite::Error::SqliteFailure(err, _)
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        AppError::UsernameTaken
                    }
                    other => AppError::Database(other),
                })?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Delete a user and everything attached to them in one transaction.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM workouts WHERE user_id = ?", [&id])?;
            tx.execute("DELETE FROM sessions WHERE user_id = ?", [&id])?;
            tx.execute("DELETE FROM access_tokens WHERE user_id = ?", [&id])?;
            tx.execute("DELETE FROM refresh_tokens WHERE user_id = ?", [&id])?;
            let rows = tx.execute("DELETE FROM users WHERE id = ?", [&id])?;
            tx.commit()?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
