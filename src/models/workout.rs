use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub workout_type: Option<String>,
    pub title: Option<String>,
    pub comments: Option<String>,
    pub completed_hours: f64,
    pub planned_hours: f64,
    pub distance_km: Option<f64>,
    pub external_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            workout_type: row.get("workout_type")?,
            title: row.get("title")?,
            comments: row.get("comments")?,
            completed_hours: row.get("completed_hours")?,
            planned_hours: row.get("planned_hours")?,
            distance_km: row.get("distance_km")?,
            external_id: row.get("external_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Validated workout fields, ready for the repository.
#[derive(Debug, Clone)]
pub struct WorkoutFields {
    pub date: NaiveDate,
    pub workout_type: Option<String>,
    pub title: Option<String>,
    pub comments: Option<String>,
    pub completed_hours: f64,
    pub planned_hours: f64,
    pub distance_km: Option<f64>,
}

/// Raw workout form input, shared by the self-service and coach routes.
/// Numbers arrive as strings so empty inputs can be told apart from zero.
#[derive(Debug, Deserialize)]
pub struct WorkoutForm {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub workout_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub completed_hours: Option<String>,
    #[serde(default)]
    pub planned_hours: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
}

impl WorkoutForm {
    /// Validate form input into `WorkoutFields`.
    ///
    /// Completed hours must be a positive number; planned hours default to 0
    /// and must not be negative; at least one of type/title/comments must be
    /// present; the date is required.
    pub fn validate(self) -> Result<WorkoutFields, String> {
        let completed_hours = match non_empty(self.completed_hours) {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| "Completed hours must be a valid number".to_string())?,
            None => return Err("Completed hours must be a positive number".to_string()),
        };
        if completed_hours <= 0.0 {
            return Err("Completed hours must be a positive number".to_string());
        }

        let planned_hours = match non_empty(self.planned_hours) {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| "Planned hours must be a valid number".to_string())?,
            None => 0.0,
        };
        if planned_hours < 0.0 {
            return Err("Planned hours must not be negative".to_string());
        }

        let workout_type = non_empty(self.workout_type);
        let title = non_empty(self.title);
        let comments = non_empty(self.comments);
        if workout_type.is_none() && title.is_none() && comments.is_none() {
            return Err("must provide more info (title, type, comments)".to_string());
        }

        let date = match non_empty(self.date) {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| "must provide a valid date".to_string())?,
            None => return Err("must provide the date".to_string()),
        };

        let distance_km = match non_empty(self.distance) {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .map_err(|_| "Distance must be a valid number".to_string())?,
            ),
            None => None,
        };

        Ok(WorkoutFields {
            date,
            workout_type,
            title,
            comments,
            completed_hours,
            planned_hours,
            distance_km,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
