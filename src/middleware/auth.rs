use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::models::UserRole;
use crate::repositories::{SessionRepository, UserRepository};
use crate::session;

/// The logged-in user, resolved from the session cookie on every request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_coach(&self) -> bool {
        self.role.is_coach()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionRepository: FromRef<S>,
    UserRepository: FromRef<S>,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session::get_session_token(&jar).ok_or(AuthRedirect)?;

        let session_repo = SessionRepository::from_ref(state);
        let user_repo = UserRepository::from_ref(state);

        let user_id = session_repo
            .find_valid(&token)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;
        let user = user_repo
            .find_by_id(&user_id)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRedirect)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

/// Coach gate. Authentication runs first; the role flag is then read fresh
/// from the database so a demotion takes effect on the next request.
pub struct CoachUser(pub AuthUser);

impl<S> FromRequestParts<S> for CoachUser
where
    S: Send + Sync,
    SessionRepository: FromRef<S>,
    UserRepository: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !auth_user.is_coach() {
            return Err(AppError::CoachRequired.into_response());
        }

        Ok(CoachUser(auth_user))
    }
}
