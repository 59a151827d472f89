use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wom_sync::{
    ConfigStore, InMemoryConfigStore, PostgresConfigStore, SchedulerConfig, SyncConfig, SyncError,
    SyncScheduler, SyncService, WomClient,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wom_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Competition sync exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SyncError> {
    let config = SyncConfig::from_env()?;
    info!(
        group_id = config.group_id,
        hunt_competition_id = ?config.hunt_competition_id,
        "Starting competition sync"
    );

    let store = build_store(&config).await?;
    let api = Arc::new(WomClient::new(&config)?);
    let service = Arc::new(SyncService::new(
        api,
        store,
        config.site_base_url.clone(),
        config.hunt_competition_id,
    ));

    let mut scheduler = SyncScheduler::new(service, SchedulerConfig::from(&config));
    scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| SyncError::Config(format!("failed to listen for shutdown signal: {}", e)))?;

    info!("Shutdown signal received");
    scheduler.stop().await;
    Ok(())
}

/// PostgreSQL when DATABASE_URL is set, otherwise an in-memory store
async fn build_store(config: &SyncConfig) -> Result<Arc<dyn ConfigStore>, SyncError> {
    match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .map_err(|e| SyncError::Store(format!("failed to connect to database: {}", e)))?;
            let store = PostgresConfigStore::new(pool, config.config_group.clone());
            store.ensure_schema().await?;
            info!(group = %config.config_group, "Using PostgreSQL config store");
            let store: Arc<dyn ConfigStore> = Arc::new(store);
            Ok(store)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory config store");
            Ok(Arc::new(InMemoryConfigStore::new()))
        }
    }
}
