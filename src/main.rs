use std::sync::Arc;

use redis::Client as RedisClient;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitebanner_api::{
    config::Config,
    db::{self, notifications::PgNotificationStore},
    routes,
    services::cache::RedisCache,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    if config.admin_key.is_none() {
        warn!("ADMIN_KEY not set — admin API disabled");
    }

    let state = AppState::new(
        pool.clone(),
        config.clone(),
        Arc::new(PgNotificationStore::new(pool)),
        Arc::new(RedisCache::new(redis_conn)),
    );
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("site banner API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
