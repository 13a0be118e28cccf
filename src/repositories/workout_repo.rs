use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, Workout, WorkoutFields};

/// Date ordering for workout listings. Callers pick the direction that
/// suits the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, fields: WorkoutFields) -> Result<Workout> {
        let pool = self.pool.clone();
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            date: fields.date,
            workout_type: fields.workout_type,
            title: fields.title,
            comments: fields.comments,
            completed_hours: fields.completed_hours,
            planned_hours: fields.planned_hours,
            distance_km: fields.distance_km,
            external_id: None,
            created_at: Utc::now(),
        };
        let workout_clone = workout.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workouts (id, user_id, date, workout_type, title, comments, completed_hours, planned_hours, distance_km, external_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    workout_clone.id,
                    workout_clone.user_id,
                    workout_clone.date,
                    workout_clone.workout_type,
                    workout_clone.title,
                    workout_clone.comments,
                    workout_clone.completed_hours,
                    workout_clone.planned_hours,
                    workout_clone.distance_km,
                    workout_clone.external_id,
                    workout_clone.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(workout)
    }

    /// Create the same workout for several athletes in one transaction.
    /// Either every athlete gets a row or none do.
    pub async fn create_for_athletes(
        &self,
        athlete_ids: &[String],
        fields: WorkoutFields,
    ) -> Result<usize> {
        let pool = self.pool.clone();
        let athlete_ids = athlete_ids.to_vec();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let mut created = 0;
            for athlete_id in &athlete_ids {
                tx.execute(
                    "INSERT INTO workouts (id, user_id, date, workout_type, title, comments, completed_hours, planned_hours, distance_km, external_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)",
                    rusqlite::params![
                        Uuid::new_v4().to_string(),
                        athlete_id,
                        fields.date,
                        fields.workout_type,
                        fields.title,
                        fields.comments,
                        fields.completed_hours,
                        fields.planned_hours,
                        fields.distance_km,
                        now
                    ],
                )?;
                created += 1;
            }
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workouts WHERE id = ?")?;
            let result = stmt.query_row([&id], Workout::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// List a user's workouts, optionally restricted to a date range.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        order: SortOrder,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let direction = order.as_sql();
            let workouts = match range {
                Some((start, end)) => {
                    let sql = format!(
                        "SELECT * FROM workouts WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date {direction}, created_at {direction}"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map(rusqlite::params![user_id, start, end], Workout::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                None => {
                    let sql = format!(
                        "SELECT * FROM workouts WHERE user_id = ? ORDER BY date {direction}, created_at {direction}"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([&user_id], Workout::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Total completed hours in a date range, for the dashboard summary.
    pub async fn completed_hours_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let total: f64 = conn.query_row(
                "SELECT COALESCE(SUM(completed_hours), 0) FROM workouts WHERE user_id = ? AND date >= ? AND date <= ?",
                rusqlite::params![user_id, start, end],
                |row| row.get(0),
            )?;
            Ok(total)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Update a workout the caller owns. Rows belonging to other users are
    /// left untouched and reported as not found.
    pub async fn update_owned(
        &self,
        id: &str,
        user_id: &str,
        fields: WorkoutFields,
    ) -> Result<bool> {
        self.update_scoped(id, user_id, fields).await
    }

    /// Coach-side update, scoped to the target athlete so a mismatched id
    /// cannot touch another athlete's row.
    pub async fn update_for_athlete(
        &self,
        id: &str,
        athlete_id: &str,
        fields: WorkoutFields,
    ) -> Result<bool> {
        self.update_scoped(id, athlete_id, fields).await
    }

    async fn update_scoped(&self, id: &str, user_id: &str, fields: WorkoutFields) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workouts SET date = ?, workout_type = ?, title = ?, comments = ?, completed_hours = ?, planned_hours = ?, distance_km = ? WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    fields.date,
                    fields.workout_type,
                    fields.title,
                    fields.comments,
                    fields.completed_hours,
                    fields.planned_hours,
                    fields.distance_km,
                    id,
                    user_id
                ],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Delete a workout the caller owns.
    pub async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workouts WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Coach-side delete by workout id alone.
    pub async fn delete_any(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM workouts WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Insert an imported activity, skipping it when the external id is
    /// already on file. Returns whether a row was inserted.
    pub async fn import_activity(
        &self,
        user_id: &str,
        external_id: i64,
        fields: WorkoutFields,
    ) -> Result<bool> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "INSERT OR IGNORE INTO workouts (id, user_id, date, workout_type, title, comments, completed_hours, planned_hours, distance_km, external_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    user_id,
                    fields.date,
                    fields.workout_type,
                    fields.title,
                    fields.comments,
                    fields.completed_hours,
                    fields.planned_hours,
                    fields.distance_km,
                    external_id,
                    Utc::now()
                ],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
