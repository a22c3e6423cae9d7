use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
            // Known development fallback; never deploy without SESSION_SECRET set.
            warn!("SESSION_SECRET not set, using insecure development default");
            "dev_secret".into()
        });
        let session = SessionConfig {
            secret,
            cookie_name: std::env::var("COOKIE_NAME").unwrap_or_else(|_| "potion_session".into()),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        Ok(Self {
            port,
            database_url,
            session,
        })
    }
}
