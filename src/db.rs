use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect eagerly at startup so a bad DATABASE_URL fails fast.
pub async fn create_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .expect("Failed to create database pool")
}
