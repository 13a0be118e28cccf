use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};

use crate::handlers::{account, auth, dashboard, health, strava, workouts};

pub fn create_router(
    auth_state: auth::AuthState,
    dashboard_state: dashboard::DashboardState,
    workouts_state: workouts::WorkoutsState,
    account_state: account::AccountState,
    strava_state: strava::StravaState,
) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        .with_state(dashboard_state)
        // Auth routes
        .route(
            "/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .with_state(auth_state)
        // Workout routes
        .route("/athlete", get(workouts::athlete_page))
        .route(
            "/add-workout",
            get(workouts::add_workout_page).post(workouts::add_workout_submit),
        )
        .route(
            "/add-workout-coach",
            get(workouts::add_workout_coach_page).post(workouts::add_workout_coach_submit),
        )
        .route(
            "/update-workout",
            get(workouts::update_workout_page).post(workouts::update_workout_submit),
        )
        .route(
            "/update-workout-coach",
            get(workouts::update_workout_coach_page).post(workouts::update_workout_coach_submit),
        )
        .route(
            "/delete-workout",
            get(workouts::delete_workout_page).post(workouts::delete_workout_submit),
        )
        .route(
            "/delete-workout-coach",
            get(workouts::delete_workout_coach_page).post(workouts::delete_workout_coach_submit),
        )
        .with_state(workouts_state)
        // Coach account routes
        .route("/view-athletes", get(account::view_athletes))
        .route(
            "/update-account",
            get(account::update_account_page).post(account::update_account_submit),
        )
        .route(
            "/delete-account",
            get(account::delete_account_page).post(account::delete_account_submit),
        )
        .with_state(account_state)
        // Provider integration
        .route("/authorize-redirect", get(strava::authorize_redirect))
        .route("/oauth-callback", get(strava::oauth_callback))
        .route("/sync-activities", get(strava::sync_activities))
        .with_state(strava_state)
        // Health check
        .route("/health", get(health::health_check))
        .layer(middleware::from_fn(no_cache))
}

/// Every response is marked uncacheable so the browser re-fetches pages
/// after logout or data changes.
async fn no_cache(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}
