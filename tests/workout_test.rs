mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;
use trainlog::models::{UserRole, WorkoutFields};
use trainlog::repositories::{SortOrder, UserRepository, WorkoutRepository};

fn fields(date: &str, title: &str, completed: f64) -> WorkoutFields {
    WorkoutFields {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        workout_type: None,
        title: Some(title.to_string()),
        comments: None,
        completed_hours: completed,
        planned_hours: 0.0,
        distance_km: None,
    }
}

#[tokio::test]
async fn test_add_workout_and_view_log() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let cookie = common::auth_cookie(&pool, &alice).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "date=2024-05-01&workout_type=run&title=Morning+intervals\
                     &completed_hours=1.5&planned_hours=2&distance=12",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/athlete");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/athlete")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_str = String::from_utf8_lossy(&body);
    assert!(body_str.contains("Morning intervals"));
    assert!(body_str.contains("2024-05-01"));

    let workout_repo = WorkoutRepository::new(pool);
    let workouts = workout_repo
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].completed_hours, 1.5);
    assert_eq!(workouts[0].planned_hours, 2.0);
    assert_eq!(workouts[0].distance_km, Some(12.0));
}

#[tokio::test]
async fn test_add_workout_rejects_zero_completed_hours() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let cookie = common::auth_cookie(&pool, &alice).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("date=2024-05-01&title=Rest&completed_hours=0"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let workout_repo = WorkoutRepository::new(pool);
    let workouts = workout_repo
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert!(workouts.is_empty());
}

#[tokio::test]
async fn test_add_workout_defaults_planned_hours() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let cookie = common::auth_cookie(&pool, &alice).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("date=2024-05-01&title=Easy+spin&completed_hours=1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let workout_repo = WorkoutRepository::new(pool);
    let workouts = workout_repo
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert_eq!(workouts[0].planned_hours, 0.0);
}

#[tokio::test]
async fn test_log_lists_workouts_oldest_first() {
    let pool = common::setup_test_db();
    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;

    let workout_repo = WorkoutRepository::new(pool);
    workout_repo
        .create(&alice.id, fields("2024-05-03", "Later", 1.0))
        .await
        .unwrap();
    workout_repo
        .create(&alice.id, fields("2024-05-01", "Earlier", 1.0))
        .await
        .unwrap();

    let ascending = workout_repo
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert_eq!(ascending[0].title.as_deref(), Some("Earlier"));
    assert_eq!(ascending[1].title.as_deref(), Some("Later"));

    let descending = workout_repo
        .list_for_user(&alice.id, SortOrder::Descending, None)
        .await
        .unwrap();
    assert_eq!(descending[0].title.as_deref(), Some("Later"));
}

#[tokio::test]
async fn test_update_workout_rejects_foreign_row() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let bob = common::create_test_user(&pool, "bob", "secret123", UserRole::Athlete).await;

    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout = workout_repo
        .create(&alice.id, fields("2024-05-01", "Long run", 2.0))
        .await
        .unwrap();

    let bob_cookie = common::auth_cookie(&pool, &bob).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update-workout")
                .header(header::COOKIE, &bob_cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "id={}&date=2024-05-01&title=Hijacked&completed_hours=9",
                    workout.id
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let unchanged = workout_repo.find_by_id(&workout.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title.as_deref(), Some("Long run"));
    assert_eq!(unchanged.completed_hours, 2.0);
}

#[tokio::test]
async fn test_update_workout_owner_succeeds() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout = workout_repo
        .create(&alice.id, fields("2024-05-01", "Long run", 2.0))
        .await
        .unwrap();

    let cookie = common::auth_cookie(&pool, &alice).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "id={}&date=2024-05-02&title=Long+run+revised&completed_hours=2.5",
                    workout.id
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/athlete");

    let updated = workout_repo.find_by_id(&workout.id).await.unwrap().unwrap();
    assert_eq!(updated.title.as_deref(), Some("Long run revised"));
    assert_eq!(updated.completed_hours, 2.5);
    assert_eq!(updated.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
}

#[tokio::test]
async fn test_delete_workout_rejects_foreign_row() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let bob = common::create_test_user(&pool, "bob", "secret123", UserRole::Athlete).await;

    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout = workout_repo
        .create(&alice.id, fields("2024-05-01", "Long run", 2.0))
        .await
        .unwrap();

    let bob_cookie = common::auth_cookie(&pool, &bob).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/delete-workout")
                .header(header::COOKIE, &bob_cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("id={}", workout.id)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(workout_repo.find_by_id(&workout.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_workout_owner_succeeds() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let workout_repo = WorkoutRepository::new(pool.clone());
    let workout = workout_repo
        .create(&alice.id, fields("2024-05-01", "Long run", 2.0))
        .await
        .unwrap();

    let cookie = common::auth_cookie(&pool, &alice).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/delete-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("id={}", workout.id)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(workout_repo.find_by_id(&workout.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_athlete_page_rejects_non_coach_viewing_others() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let bob = common::create_test_user(&pool, "bob", "secret123", UserRole::Athlete).await;

    let bob_cookie = common::auth_cookie(&pool, &bob).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/athlete?id={}", alice.id))
                .header(header::COOKIE, &bob_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_shows_recent_workouts() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;
    let workout_repo = WorkoutRepository::new(pool.clone());
    workout_repo
        .create(&alice.id, fields("2024-05-01", "Tempo session", 1.0))
        .await
        .unwrap();

    let cookie = common::auth_cookie(&pool, &alice).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_str = String::from_utf8_lossy(&body);
    assert!(body_str.contains("Tempo session"));
}

#[tokio::test]
async fn test_completed_hours_between_sums_range_only() {
    let pool = common::setup_test_db();
    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;

    let workout_repo = WorkoutRepository::new(pool);
    workout_repo
        .create(&alice.id, fields("2024-05-06", "In range", 1.5))
        .await
        .unwrap();
    workout_repo
        .create(&alice.id, fields("2024-05-08", "Also in range", 2.0))
        .await
        .unwrap();
    workout_repo
        .create(&alice.id, fields("2024-04-30", "Before", 4.0))
        .await
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
    let total = workout_repo
        .completed_hours_between(&alice.id, start, end)
        .await
        .unwrap();
    assert_eq!(total, 3.5);
}

#[tokio::test]
async fn test_import_activity_dedupes_on_external_id() {
    let pool = common::setup_test_db();
    let alice = common::create_test_user(&pool, "alice", "secret123", UserRole::Athlete).await;

    let workout_repo = WorkoutRepository::new(pool);
    let first = workout_repo
        .import_activity(&alice.id, 42, fields("2024-05-01", "Morning Run", 1.0))
        .await
        .unwrap();
    assert!(first);

    let second = workout_repo
        .import_activity(&alice.id, 42, fields("2024-05-01", "Morning Run", 1.0))
        .await
        .unwrap();
    assert!(!second);

    let workouts = workout_repo
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].external_id, Some(42));
}

#[tokio::test]
async fn test_register_login_and_first_workout() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=alice&password=secret123&confirmation=secret123",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=alice&password=secret123"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-workout")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "date=2024-05-01&workout_type=run&completed_hours=1&planned_hours=1",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let user_repo = UserRepository::new(pool.clone());
    let alice = user_repo.find_by_username("alice").await.unwrap().unwrap();

    let workouts = WorkoutRepository::new(pool)
        .list_for_user(&alice.id, SortOrder::Ascending, None)
        .await
        .unwrap();
    assert_eq!(workouts.len(), 1);
    assert!(!workouts[0].id.is_empty());
    assert_eq!(
        workouts[0].date,
        NaiveDate::parse_from_str("2024-05-01", "%Y-%m-%d").unwrap()
    );
    assert_eq!(workouts[0].workout_type.as_deref(), Some("run"));
    assert_eq!(workouts[0].completed_hours, 1.0);
    assert_eq!(workouts[0].planned_hours, 1.0);
}
