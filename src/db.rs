use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Schema migrations embedded from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn establish_connection(
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    tracing::info!("Migrations executed successfully");

    Ok(pool)
}
