use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Creates a connection pool and applies pending migrations.
///
/// # Errors
/// Returns an error if the database connection cannot be established or a
/// migration fails.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
