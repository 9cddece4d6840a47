use market_data_store::{establish_connection_pool, AppConfig, DelistingCleanupJob};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_data_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("🗄️  Initializing PostgreSQL connection...");

    let database = match establish_connection_pool(
        &config.database.url,
        config.database.pool_max_size,
        config.database.connection_timeout(),
    ) {
        Ok(database) => database,
        Err(e) => {
            tracing::error!("❌ Failed to establish database connection: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = database.run_migrations() {
        tracing::error!("❌ Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    tracing::info!("✅ Database ready");

    let scheduler = match initialize_cron_scheduler(&config, database).await {
        Some(scheduler) => scheduler,
        None => std::process::exit(1),
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("Shutting down...");

    let mut scheduler = scheduler;
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("⚠️  Cron scheduler did not shut down cleanly: {}", e);
    }
}

/// Initialize cron scheduler for periodic jobs
async fn initialize_cron_scheduler(
    config: &AppConfig,
    database: market_data_store::Database,
) -> Option<JobScheduler> {
    tracing::info!("⏰ Initializing cron scheduler...");

    // Create scheduler
    let scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("❌ Failed to create cron scheduler: {}", e);
            return None;
        }
    };

    let delisting_job = DelistingCleanupJob::with_default_repositories(
        database,
        config.jobs.delisting_retention_days,
    );

    if let Err(e) = delisting_job
        .register(&scheduler, &config.jobs.delisting_cron)
        .await
    {
        tracing::error!("❌ Failed to register delisting cleanup job: {}", e);
        return None;
    }

    // Start scheduler
    if let Err(e) = scheduler.start().await {
        tracing::error!("❌ Failed to start cron scheduler: {}", e);
        return None;
    }

    tracing::info!("✅ Cron scheduler started successfully");
    tracing::info!(
        "   • Delisting cleanup: {} (retention {} days)",
        config.jobs.delisting_cron,
        config.jobs.delisting_retention_days
    );

    Some(scheduler)
}
