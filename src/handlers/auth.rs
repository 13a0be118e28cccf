use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, Result};
use crate::models::{LoginForm, RegisterForm, UserRole};
use crate::repositories::{SessionRepository, UserRepository};
use crate::session;

#[derive(Clone, axum::extract::FromRef)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

// Templates
#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {}

// Handlers
pub async fn register_page() -> Result<Response> {
    let template = RegisterTemplate {};
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn register_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.username.trim().is_empty() {
        return Err(AppError::Validation("must provide username".to_string()));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("must provide password".to_string()));
    }
    if form.password != form.confirmation {
        return Err(AppError::Validation(
            "password and confirmation must match".to_string(),
        ));
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

    let role = if matches!(form.coach.as_deref(), Some("on" | "true" | "1")) {
        UserRole::Coach
    } else {
        UserRole::Athlete
    };

    let user = state
        .user_repo
        .create(
            form.username.trim(),
            &form.password,
            role,
            planned_hours,
            graduation_year,
        )
        .await?;

    let token = state.session_repo.create(&user.id).await?;
    let jar = jar.add(session::create_session_cookie(&token));

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn login_page() -> Result<Response> {
    let template = LoginTemplate {};
    Ok(Html(
        template
            .render()
            .map_err(|e| AppError::Internal(e.to_string()))?,
    )
    .into_response())
}

pub async fn login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "must provide username and password".to_string(),
        ));
    }

    let user = state
        .user_repo
        .verify_password(form.username.trim(), &form.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state.session_repo.create(&user.id).await?;
    let jar = jar.add(session::create_session_cookie(&token));

    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> Result<Response> {
    if let Some(token) = session::get_session_token(&jar) {
        state.session_repo.delete(&token).await?;
    }
    let jar = jar.add(session::remove_session_cookie());

    Ok((jar, Redirect::to("/")).into_response())
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
