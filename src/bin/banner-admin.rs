//! Manage site banner notifications from the command line.
//!
//! Writes go through the same service as the HTTP API, so the banner cache
//! is resynced after every change.
//!
//! Usage: banner-admin <COMMAND>
//!   list [--search TEXT]
//!   create TEXT [--show]
//!   show ID | hide ID | delete ID
//!   resync-cache

use std::sync::Arc;

use clap::{Parser, Subcommand};
use redis::Client as RedisClient;

use sitebanner_api::{
    config::Config,
    db::{self, notifications::PgNotificationStore},
    models::notification::{
        CreateNotificationRequest, Notification, UpdateNotificationRequest,
    },
    services::{
        cache::{BannerCache, RedisCache},
        cache_sync::CacheSync,
        notifications::NotificationService,
        store::NotificationStore,
    },
};

#[derive(Parser)]
#[command(name = "banner-admin", about = "Manage the site-wide notification banner")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List notifications, the shown one first
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a notification
    Create {
        text: String,
        /// Put it on the website right away
        #[arg(long)]
        show: bool,
    },
    /// Put a notification on the website (hides any other)
    Show { id: i64 },
    /// Take a notification off the website
    Hide { id: i64 },
    /// Delete a notification
    Delete { id: i64 },
    /// Rebuild the banner cache entries from the database
    ResyncCache,
}

fn print_row(n: &Notification) {
    let marker = if n.show_this_message { "*" } else { " " };
    println!("{marker} #{:<5} {:<18} {}", n.id, n.shown_since_display(), n.text);
}

fn toggle(show: bool) -> UpdateNotificationRequest {
    UpdateNotificationRequest {
        text: None,
        show_this_message: Some(show),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, 2).await?;
    let redis_conn = RedisClient::open(config.redis_url.as_str())?
        .get_multiplexed_async_connection()
        .await?;

    let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(pool));
    let cache = BannerCache::from_config(Arc::new(RedisCache::new(redis_conn)), &config);
    let sync = Arc::new(CacheSync::new(cache));
    let service = NotificationService::new(store.clone()).with_hook(sync.clone());

    match args.command {
        Command::List { search } => {
            for n in service.list(search.as_deref()).await? {
                print_row(&n);
            }
        }
        Command::Create { text, show } => {
            let n = service
                .create(CreateNotificationRequest {
                    text,
                    show_this_message: show,
                })
                .await?;
            print_row(&n);
        }
        Command::Show { id } => print_row(&service.update(id, toggle(true)).await?),
        Command::Hide { id } => print_row(&service.update(id, toggle(false)).await?),
        Command::Delete { id } => {
            service.delete(id).await?;
            tracing::info!("Deleted notification #{id}");
        }
        Command::ResyncCache => {
            sync.resync(store.as_ref()).await;
            tracing::info!("Banner cache resynced");
        }
    }

    Ok(())
}
