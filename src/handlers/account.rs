use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, CoachUser};
use crate::models::User;
use crate::repositories::{SessionRepository, UserRepository};
use crate::session;

#[derive(Clone, axum::extract::FromRef)]
pub struct AccountState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

// Templates
#[derive(Template)]
#[template(path = "account/athletes.html")]
struct AthletesTemplate {
    user: AuthUser,
    athletes: Vec<User>,
}

#[derive(Template)]
#[template(path = "account/update.html")]
struct UpdateAccountTemplate {
    user: AuthUser,
    athlete: User,
}

#[derive(Template)]
#[template(path = "account/delete.html")]
struct DeleteAccountTemplate {
    user: AuthUser,
    athlete: User,
    is_self: bool,
}

// Forms
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirmation: Option<String>,
    #[serde(default)]
    pub planned_hours: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub verification: Option<String>,
}

// Handlers
pub async fn view_athletes(State(state): State<AccountState>, coach: CoachUser) -> Result<Response> {
    let athletes = state.user_repo.list_athletes().await?;
    let template = AthletesTemplate {
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

pub async fn update_account_page(
    State(state): State<AccountState>,
    coach: CoachUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let athlete = find_athlete(&state, query.id).await?;
    let template = UpdateAccountTemplate {
        user: coach.0,
        athlete,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn update_account_submit(
    State(state): State<AccountState>,
    _coach: CoachUser,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    let username = trimmed(form.username)
        .ok_or_else(|| AppError::Validation("must provide username".to_string()))?;

    let password = form.password.filter(|p| !p.is_empty());
    if let Some(ref password) = password {
        if form.confirmation.as_deref() != Some(password.as_str()) {
            return Err(AppError::Validation(
                "password and confirmation must match".to_string(),
            ));
        }
    }

    let planned_hours = match trimmed(form.planned_hours) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .map_err(|_| AppError::Validation("Planned hours must be a valid number".to_string()))?,
        ),
        None => None,
    };
    if planned_hours.is_some_and(|hours| hours < 0.0) {
        return Err(AppError::Validation(
            "Planned hours must not be negative".to_string(),
        ));
    }

    let graduation_year = match trimmed(form.graduation_year) {
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| AppError::Validation("Graduation year must be a valid year".to_string()))?,
        ),
        None => None,
    };

    let updated = state
        .user_repo
        .update_account(
            &form.id,
            &username,
            password.as_deref(),
            planned_hours,
            graduation_year,
        )
        .await?;
    if !updated {
        return Err(AppError::NotFound("athlete not found".to_string()));
    }

    Ok(Redirect::to("/view-athletes").into_response())
}

/// Confirmation page: with `?id=` the selected athlete, without it the
/// coach's own account.
pub async fn delete_account_page(
    State(state): State<AccountState>,
    coach: CoachUser,
    Query(query): Query<IdQuery>,
) -> Result<Response> {
    let athlete = match query.id {
        Some(_) => find_athlete(&state, query.id).await?,
        None => state
            .user_repo
            .find_by_id(&coach.0.id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?,
    };
    let is_self = athlete.id == coach.0.id;
    let template = DeleteAccountTemplate {
        user: coach.0,
        athlete,
        is_self,
    };
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn delete_account_submit(
    State(state): State<AccountState>,
    coach: CoachUser,
    jar: CookieJar,
    Form(form): Form<DeleteAccountForm>,
) -> Result<Response> {
    let Some(id) = form.id else {
        let confirmed = form
            .verification
            .as_deref()
            .is_some_and(|v| v.trim() == coach.0.username);
        if !confirmed {
            return Err(AppError::Validation(
                "must type your username to confirm".to_string(),
            ));
        }

        state.user_repo.delete(&coach.0.id).await?;
        tracing::info!(user_id = %coach.0.id, "coach deleted own account");

        let jar = jar.add(session::remove_session_cookie());
        return Ok((jar, Redirect::to("/")).into_response());
    };

    if id == coach.0.id {
        return Err(AppError::Validation(
            "cannot select your own account".to_string(),
        ));
    }

    let athlete = state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("athlete not found".to_string()))?;

    let confirmed = form
        .verification
        .as_deref()
        .is_some_and(|v| v.trim() == athlete.username);
    if !confirmed {
        return Err(AppError::Validation(
            "must type the athlete's username to confirm".to_string(),
        ));
    }

    state.user_repo.delete(&athlete.id).await?;
    tracing::info!(athlete_id = %athlete.id, "account deleted");

    Ok(Redirect::to("/view-athletes").into_response())
}

async fn find_athlete(state: &AccountState, id: Option<String>) -> Result<User> {
    let id = id.ok_or_else(|| AppError::Validation("must provide an athlete id".to_string()))?;
    state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("athlete not found".to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}
