use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use trainlog::config::StravaConfig;
use trainlog::db::{create_memory_pool, DbPool};
use trainlog::migrations::run_migrations_for_tests;
use trainlog::models::{User, UserRole};
use trainlog::repositories::{SessionRepository, TokenRepository, UserRepository, WorkoutRepository};
use trainlog::strava::{StravaClient, StravaService};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

/// Provider endpoints pointing at a closed local port so any accidental
/// network call fails fast instead of reaching the real provider.
pub fn test_strava_config() -> StravaConfig {
    StravaConfig {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://127.0.0.1:3000/oauth-callback".to_string(),
        authorize_url: "http://127.0.0.1:1/oauth/authorize".to_string(),
        token_url: "http://127.0.0.1:1/oauth/token".to_string(),
        api_base: "http://127.0.0.1:1/api/v3".to_string(),
    }
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_strava(pool, test_strava_config())
}

pub fn create_test_app_with_strava(pool: DbPool, strava_config: StravaConfig) -> Router {
    use trainlog::handlers::{account, auth, dashboard, strava, workouts};

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let token_repo = TokenRepository::new(pool.clone());

    let strava_client = StravaClient::new(strava_config).expect("Failed to build provider client");
    let strava_service = StravaService::new(strava_client, token_repo);

    // Create handler states
    let auth_state = auth::AuthState {
        user_repo: user_repo.clone(),
        session_repo: session_repo.clone(),
    };
    let dashboard_state = dashboard::DashboardState {
        user_repo: user_repo.clone(),
        session_repo: session_repo.clone(),
        workout_repo: workout_repo.clone(),
    };
    let workouts_state = workouts::WorkoutsState {
        user_repo: user_repo.clone(),
        session_repo: session_repo.clone(),
        workout_repo: workout_repo.clone(),
    };
    let account_state = account::AccountState {
        user_repo: user_repo.clone(),
        session_repo: session_repo.clone(),
    };
    let strava_state = strava::StravaState {
        user_repo,
        session_repo,
        workout_repo,
        strava: strava_service,
    };

    trainlog::routes::create_router(
        auth_state,
        dashboard_state,
        workouts_state,
        account_state,
        strava_state,
    )
}

pub async fn create_test_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    role: UserRole,
) -> User {
    let user_repo = UserRepository::new(pool.clone());
    user_repo
        .create(username, password, role, None, None)
        .await
        .unwrap()
}

/// Log the user in directly and return a `Cookie` header value.
pub async fn auth_cookie(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo.create(&user.id).await.unwrap();
    format!("session={token}")
}

/// Serve exactly one canned HTTP response on a random local port and return
/// the base URL. The listener goes away after the first request.
pub async fn one_shot_server(status: &str, body: String) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let status = status.to_string();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            loop {
                match stream.read(&mut buf[read..]).await {
                    Ok(0) => break,
                    Ok(n) => {
                        read += n;
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}")
}
