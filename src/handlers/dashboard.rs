use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Datelike, Duration, Utc};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::Workout;
use crate::repositories::{SessionRepository, SortOrder, UserRepository, WorkoutRepository};

const RECENT_WORKOUTS: usize = 10;

#[derive(Clone, axum::extract::FromRef)]
pub struct DashboardState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub workout_repo: WorkoutRepository,
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    user: AuthUser,
    workouts: Vec<Workout>,
    week_completed: f64,
    week_planned: Option<f64>,
}

/// Athlete home page: recent workouts and this week's hours against the
/// planned target. Coaches land on the athlete roster instead.
pub async fn index(State(state): State<DashboardState>, auth_user: AuthUser) -> Result<Response> {
    if auth_user.is_coach() {
        return Ok(Redirect::to("/view-athletes").into_response());
    }

    let user = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let today = Utc::now().date_naive();
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let week_end = week_start + Duration::days(6);
    let week_completed = state
        .workout_repo
        .completed_hours_between(&auth_user.id, week_start, week_end)
        .await?;

    let mut workouts = state
        .workout_repo
        .list_for_user(&auth_user.id, SortOrder::Descending, None)
        .await?;
    workouts.truncate(RECENT_WORKOUTS);

    let template = DashboardTemplate {
        user: auth_user,
        workouts,
        week_completed,
        week_planned: user.planned_hours,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}
