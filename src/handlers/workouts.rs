use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::Form as MultiForm;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, CoachUser};
use crate::models::{User, Workout, WorkoutForm};
use crate::repositories::{SessionRepository, SortOrder, UserRepository, WorkoutRepository};

#[derive(Clone, axum::extract::FromRef)]
pub struct WorkoutsState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub workout_repo: WorkoutRepository,
}

// Templates
#[derive(Template)]
#[template(path = "workouts/athlete.html")]
struct AthleteLogTemplate {
    user: AuthUser,
    athlete: User,
    workouts: Vec<Workout>,
    is_self: bool,
}

#[derive(Template)]
#[template(path = "workouts/add.html")]
struct AddWorkoutTemplate {
    user: AuthUser,
}

#[derive(Template)]
#[template(path = "workouts/add_coach.html")]
struct AddWorkoutCoachTemplate {
    user: AuthUser,
    athletes: Vec<User>,
}

#[derive(Template)]
#[template(path = "workouts/update.html")]
struct UpdateWorkoutTemplate {
    user: AuthUser,
    workout: Workout,
}

#[derive(Template)]
#[template(path = "workouts/update_coach.html")]
struct UpdateWorkoutCoachTemplate {
    user: AuthUser,
    workout: Workout,
}

#[derive(Template)]
#[template(path = "workouts/delete.html")]
struct DeleteWorkoutTemplate {
    user: AuthUser,
    workout: Workout,
}

#[derive(Template)]
#[template(path = "workouts/delete_coach.html")]
struct DeleteWorkoutCoachTemplate {
    user: AuthUser,
    workout: Workout,
}

// Forms
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoachAddForm {
    #[serde(default)]
    pub athlete_ids: Vec<String>,
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

impl CoachAddForm {
    fn split(self) -> (Vec<String>, WorkoutForm) {
        let form = WorkoutForm {
            date: self.date,
            workout_type: self.workout_type,
            title: self.title,
            comments: self.comments,
            completed_hours: self.completed_hours,
            planned_hours: self.planned_hours,
            distance: self.distance,
        };
        (self.athlete_ids, form)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutForm {
    pub id: String,
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

impl UpdateWorkoutForm {
    fn split(self) -> (String, WorkoutForm) {
        let form = WorkoutForm {
            date: self.date,
            workout_type: self.workout_type,
            title: self.title,
            comments: self.comments,
            completed_hours: self.completed_hours,
            planned_hours: self.planned_hours,
            distance: self.distance,
        };
        (self.id, form)
    }
}

#[derive(Debug, Deserialize)]
pub struct CoachUpdateForm {
    pub id: String,
    pub athlete_id: String,
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

impl CoachUpdateForm {
    fn split(self) -> (String, String, WorkoutForm) {
        let form = WorkoutForm {
            date: self.date,
            workout_type: self.workout_type,
            title: self.title,
            comments: self.comments,
            completed_hours: self.completed_hours,
            planned_hours: self.planned_hours,
            distance: self.distance,
        };
        (self.id, self.athlete_id, form)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub id: String,
}

// Handlers

/// An athlete's full training log, oldest first. An athlete sees their own
/// log; a coach must pass `?id=` naming the athlete to view.
pub async fn athlete_page(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let athlete = if auth_user.is_coach() {
        let target_id = query
            .id
            .ok_or_else(|| AppError::Validation("must provide an athlete id".to_string()))?;
        state
            .user_repo
            .find_by_id(&target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("athlete not found".to_string()))?
    } else {
        if query.id.as_deref().is_some_and(|id| id != auth_user.id) {
            return Err(AppError::CoachRequired);
        }
        state
            .user_repo
            .find_by_id(&auth_user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?
    };

    let workouts = state
        .workout_repo
        .list_for_user(&athlete.id, SortOrder::Ascending, None)
        .await?;

    let is_self = athlete.id == auth_user.id;
    let template = AthleteLogTemplate {
        user: auth_user,
        athlete,
        workouts,
        is_self,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn add_workout_page(auth_user: AuthUser) -> Result<Response> {
    let template = AddWorkoutTemplate { user: auth_user };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn add_workout_submit(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Form(form): Form<WorkoutForm>,
) -> Result<Response> {
    let fields = form.validate().map_err(AppError::Validation)?;
    state.workout_repo.create(&auth_user.id, fields).await?;

    Ok(Redirect::to("/athlete").into_response())
}

pub async fn add_workout_coach_page(
    State(state): State<WorkoutsState>,
    coach: CoachUser,
) -> Result<Response> {
    let athletes = state.user_repo.list_athletes().await?;
    let template = AddWorkoutCoachTemplate {
        user: coach.0,
        athletes,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn add_workout_coach_submit(
    State(state): State<WorkoutsState>,
    _coach: CoachUser,
    MultiForm(form): MultiForm<CoachAddForm>,
) -> Result<Response> {
    let (athlete_ids, workout_form) = form.split();
    if athlete_ids.is_empty() {
        return Err(AppError::Validation(
            "must select at least one athlete".to_string(),
        ));
    }

    let fields = workout_form.validate().map_err(AppError::Validation)?;
    state
        .workout_repo
        .create_for_athletes(&athlete_ids, fields)
        .await?;

    Ok(Redirect::to("/view-athletes").into_response())
}

pub async fn update_workout_page(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let workout = find_owned(&state, &auth_user, query.id).await?;
    let template = UpdateWorkoutTemplate {
        user: auth_user,
        workout,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn update_workout_submit(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Form(form): Form<UpdateWorkoutForm>,
) -> Result<Response> {
    let (id, workout_form) = form.split();
    let fields = workout_form.validate().map_err(AppError::Validation)?;

    let updated = state
        .workout_repo
        .update_owned(&id, &auth_user.id, fields)
        .await?;
    if !updated {
        return Err(AppError::NotFound("workout not found".to_string()));
    }

    Ok(Redirect::to("/athlete").into_response())
}

pub async fn update_workout_coach_page(
    State(state): State<WorkoutsState>,
    coach: CoachUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let workout = find_any(&state, query.id).await?;
    let template = UpdateWorkoutCoachTemplate {
        user: coach.0,
        workout,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn update_workout_coach_submit(
    State(state): State<WorkoutsState>,
    _coach: CoachUser,
    Form(form): Form<CoachUpdateForm>,
) -> Result<Response> {
    let (id, athlete_id, workout_form) = form.split();
    let fields = workout_form.validate().map_err(AppError::Validation)?;

    let updated = state
        .workout_repo
        .update_for_athlete(&id, &athlete_id, fields)
        .await?;
    if !updated {
        return Err(AppError::NotFound("workout not found".to_string()));
    }

    Ok(Redirect::to(&format!("/athlete?id={athlete_id}")).into_response())
}

pub async fn delete_workout_page(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let workout = find_owned(&state, &auth_user, query.id).await?;
    let template = DeleteWorkoutTemplate {
        user: auth_user,
        workout,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn delete_workout_submit(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let deleted = state
        .workout_repo
        .delete_owned(&form.id, &auth_user.id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound("workout not found".to_string()));
    }

    Ok(Redirect::to("/athlete").into_response())
}

pub async fn delete_workout_coach_page(
    State(state): State<WorkoutsState>,
    coach: CoachUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let workout = find_any(&state, query.id).await?;
    let template = DeleteWorkoutCoachTemplate {
        user: coach.0,
        workout,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn delete_workout_coach_submit(
    State(state): State<WorkoutsState>,
    _coach: CoachUser,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let workout = state
        .workout_repo
        .find_by_id(&form.id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))?;

    state.workout_repo.delete_any(&workout.id).await?;

    Ok(Redirect::to(&format!("/athlete?id={}", workout.user_id)).into_response())
}

/// Look up a workout by the `id` query parameter, requiring the caller to
/// own it. Foreign rows are reported as missing rather than forbidden.
async fn find_owned(
    state: &WorkoutsState,
    auth_user: &AuthUser,
    id: Option<String>,
) -> Result<Workout> {
    let id = id.ok_or_else(|| AppError::Validation("must provide a workout id".to_string()))?;
    let workout = state
        .workout_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))?;
    if workout.user_id != auth_user.id {
        return Err(AppError::NotFound("workout not found".to_string()));
    }
    Ok(workout)
}

async fn find_any(state: &WorkoutsState, id: Option<String>) -> Result<Workout> {
    let id = id.ok_or_else(|| AppError::Validation("must provide a workout id".to_string()))?;
    state
        .workout_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))
}
