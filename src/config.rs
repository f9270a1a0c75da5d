use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use std::time::Duration;
use crate::schemas::AppState;

/// Initialize application configuration and state from the environment
pub async fn initialize_app_state() -> Result<AppState> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url();
    initialize_app_state_with_url(&database_url).await
}

/// Initialize application state against a specific database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Short TTL: base-info numbers may lag writes by up to a minute
    let cache = Cache::builder()
        .max_capacity(100)
        .time_to_live(Duration::from_secs(60))
        .build();

    Ok(AppState { db, cache })
}

/// Get database URL from environment or use default
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://gigmarket.db".to_string())
}

/// Get bind address from environment or use default
pub fn get_bind_address() -> String {
    std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}
