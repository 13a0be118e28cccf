use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Coach,
    #[default]
    Athlete,
}

impl UserRole {
    pub fn as_flag(&self) -> i64 {
        match self {
            UserRole::Coach => 1,
            UserRole::Athlete => 0,
        }
    }

    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            UserRole::Coach
        } else {
            UserRole::Athlete
        }
    }

    pub fn is_coach(&self) -> bool {
        matches!(self, UserRole::Coach)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub planned_hours: Option<f64>,
    pub graduation_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let coach: i64 = row.get("coach")?;
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            role: UserRole::from_flag(coach),
            planned_hours: row.get("planned_hours")?,
            graduation_year: row.get("graduation_year")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Fields accepted by the registration form. Numeric fields arrive as raw
/// strings so an empty input is distinguishable from a missing one.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirmation: String,
    #[serde(default)]
    pub planned_hours: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub coach: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
