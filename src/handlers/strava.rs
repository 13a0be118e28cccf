use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::repositories::{SessionRepository, UserRepository, WorkoutRepository};
use crate::strava::{StravaService, TokenError};

#[derive(Clone, axum::extract::FromRef)]
pub struct StravaState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub workout_repo: WorkoutRepository,
    pub strava: StravaService,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Send the browser to the provider's consent screen.
pub async fn authorize_redirect(
    State(state): State<StravaState>,
    _auth_user: AuthUser,
) -> Result<Response> {
    Ok(Redirect::to(&state.strava.authorize_url()).into_response())
}

/// Provider callback: exchange the code and store the grant.
pub async fn oauth_callback(
    State(state): State<StravaState>,
    auth_user: AuthUser,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        return Err(AppError::Provider(format!("authorization denied: {error}")));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::Validation("must provide an authorization code".to_string()))?;

    state
        .strava
        .connect(&auth_user.id, &code)
        .await
        .map_err(provider_error)?;

    Ok(Redirect::to("/sync-activities").into_response())
}

/// Import the user's recent provider activities into the training log.
/// Already-imported activities are skipped by external id.
pub async fn sync_activities(
    State(state): State<StravaState>,
    auth_user: AuthUser,
) -> Result<Response> {
    let activities = match state.strava.fetch_activities(&auth_user.id).await {
        Ok(list) => list,
        Err(TokenError::NotConnected) => {
            return Ok(Redirect::to("/authorize-redirect").into_response());
        }
        Err(TokenError::Storage(e)) => return Err(e),
        Err(err @ TokenError::RefreshRejected(_)) => {
            return Err(AppError::Provider(err.to_string()));
        }
        Err(err) => {
            tracing::warn!("activity sync failed: {err}");
            Vec::new()
        }
    };

    let mut imported = 0;
    for activity in &activities {
        let Some(fields) = activity.to_workout_fields() else {
            continue;
        };
        if state
            .workout_repo
            .import_activity(&auth_user.id, activity.id, fields)
            .await?
        {
            imported += 1;
        }
    }
    tracing::info!(imported, fetched = activities.len(), "activity sync complete");

    Ok(Redirect::to("/athlete").into_response())
}

fn provider_error(err: TokenError) -> AppError {
    match err {
        TokenError::Storage(e) => e,
        other => AppError::Provider(other.to_string()),
    }
}
