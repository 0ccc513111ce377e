use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    /// Value expected in `X-Admin-Key`; the admin API is closed when unset.
    pub admin_key: Option<String>,
    pub app_base_url: String,
    pub cache_ttl_seconds: u64,
    pub cache_key_prefix: String,
    pub dismiss_cookie_days: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            admin_key: env::var("ADMIN_KEY").ok().filter(|s| !s.is_empty()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".into())
                .parse()?,
            cache_key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or_default(),
            dismiss_cookie_days: env::var("DISMISS_COOKIE_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()?,
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
