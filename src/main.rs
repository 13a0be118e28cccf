use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trainlog::config::Config;
use trainlog::handlers::{account, auth, dashboard, strava, workouts};
use trainlog::repositories::{
    SessionRepository, TokenRepository, UserRepository, WorkoutRepository,
};
use trainlog::strava::{StravaClient, StravaService};
use trainlog::{db, migrations, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trainlog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);

    // Create database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    migrations::run_migrations(&pool)?;

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let token_repo = TokenRepository::new(pool.clone());

    // Provider client and token service
    let strava_client = StravaClient::new(config.strava.clone())?;
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

    // Build router
    let app = routes::create_router(
        auth_state,
        dashboard_state,
        workouts_state,
        account_state,
        strava_state,
    );

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
