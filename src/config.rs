use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub strava: StravaConfig,
}

/// Credentials and endpoints for the external fitness provider.
///
/// Built once at startup and handed to `StravaClient::new`; never read from
/// the environment after that point.
#[derive(Clone)]
pub struct StravaConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:trainlog.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            strava: StravaConfig::from_env()?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StravaConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            client_id: env::var("STRAVA_CLIENT_ID")?,
            client_secret: env::var("STRAVA_CLIENT_SECRET")?,
            redirect_uri: env::var("STRAVA_REDIRECT_URI")
                .unwrap_or_else(|_| "http://127.0.0.1:3000/oauth-callback".to_string()),
            authorize_url: env::var("STRAVA_AUTHORIZE_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth/authorize".to_string()),
            token_url: env::var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3/oauth/token".to_string()),
            api_base: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
        })
    }
}
