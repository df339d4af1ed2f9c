//! Game item catalog API server.
//!
//! Serves the public item API and the job dashboard, refreshes the item
//! cache from MongoDB, and syncs the catalog from the upstream game API on
//! a schedule.

use catalog_api::cache::{self, ItemCache};
use catalog_api::dashboard::{self, Credentials};
use catalog_api::storage::Storage;
use catalog_api::upstream::DEFAULT_UPSTREAM_URL;
use catalog_api::web;
use catalog_api::worker::{self, JobRegistry};
use clap::Parser;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;

/// Game item catalog API - serves item and skin data and syncs it from the
/// upstream game API
#[derive(Parser, Debug)]
#[command(name = "catalog_api")]
#[command(version, about, long_about = None)]
struct Args {
    /// MongoDB connection string
    #[arg(long, default_value = "mongodb://127.0.0.1:27017")]
    mongodb_uri: String,

    /// Database holding the items and cache collections
    #[arg(long, default_value = "catalog")]
    database: String,

    /// Port for the public API
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Port for the job dashboard
    #[arg(long, default_value_t = 8090)]
    dashboard_port: u16,

    /// Username for the job dashboard
    #[arg(long, default_value = "admin")]
    dashboard_user: String,

    /// Password for the job dashboard
    #[arg(long, default_value = "admin")]
    dashboard_password: String,

    /// Base URL of the upstream item API
    #[arg(long, default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Sync interval in hours when running continuously
    #[arg(long, default_value_t = 1)]
    sync_interval_hours: u64,

    /// Cache refresh interval in minutes
    #[arg(long, default_value_t = 5)]
    cache_refresh_minutes: u64,

    /// Run a single sync and exit (default: run continuously)
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Starting catalog_api...");
    log::info!("Database: {}/{}", args.mongodb_uri, args.database);

    let storage = match Storage::connect(&args.mongodb_uri, &args.database).await {
        Ok(storage) => storage,
        Err(e) => {
            log::error!("Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    // Load the cache before accepting traffic
    let item_cache = Arc::new(ItemCache::new());
    cache::refresh(&storage, &item_cache).await;

    let registry = Arc::new(Mutex::new(JobRegistry::default()));

    // Job dashboard on its own port, behind basic auth
    let dashboard_registry = Arc::clone(&registry);
    let credentials = Credentials::new(args.dashboard_user.clone(), args.dashboard_password.clone());
    let dashboard_port = args.dashboard_port;
    tokio::spawn(async move {
        if let Err(e) = dashboard::serve(dashboard_registry, credentials, dashboard_port).await {
            log::error!("Dashboard server error: {}", e);
        }
    });

    // Public API
    let web_cache = Arc::clone(&item_cache);
    let web_storage = storage.clone();
    let port = args.port;
    tokio::spawn(async move {
        if let Err(e) = web::serve(web_cache, web_storage, port).await {
            log::error!("Web server error: {}", e);
        }
    });

    if args.once {
        worker::run_sync(&storage, &args.upstream_url, &registry).await;
        return;
    }

    tokio::spawn(run_refresh_daemon(
        storage.clone(),
        Arc::clone(&item_cache),
        args.cache_refresh_minutes,
    ));

    log::info!(
        "Running in daemon mode, syncing every {} hour(s)",
        args.sync_interval_hours
    );

    tokio::select! {
        _ = run_sync_daemon(storage, args.upstream_url, registry, args.sync_interval_hours) => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down");
        }
    }
}

/// Run the sync daemon - syncs immediately, then on every interval tick
async fn run_sync_daemon(
    storage: Storage,
    upstream_url: String,
    registry: Arc<Mutex<JobRegistry>>,
    interval_hours: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_hours * 3600));

    loop {
        ticker.tick().await;
        worker::run_sync(&storage, &upstream_url, &registry).await;
    }
}

/// Refresh the item cache on every interval tick
async fn run_refresh_daemon(storage: Storage, item_cache: Arc<ItemCache>, interval_minutes: u64) {
    let mut ticker = interval(Duration::from_secs(interval_minutes * 60));

    // The first tick completes immediately; startup already loaded the cache
    ticker.tick().await;

    loop {
        ticker.tick().await;
        cache::refresh(&storage, &item_cache).await;
    }
}
