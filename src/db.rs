// src/db.rs
use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool(database_url: &str) -> AppResult<SqlitePool> {
    tracing::info!("Connessione alla base di dati: {}", database_url);

    // Crea il file se non esiste; le chiavi esterne servono per il CASCADE sui pagamenti
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    esegui_migrazioni(&pool).await?;

    Ok(pool)
}

pub async fn esegui_migrazioni(pool: &SqlitePool) -> AppResult<()> {
    tracing::info!("Esecuzione delle migrazioni...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrazioni completate.");
    Ok(())
}

/// Pool in memoria con lo schema già applicato.
///
/// Una sola connessione: ogni connessione `:memory:` è un database distinto.
pub async fn pool_in_memoria() -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    esegui_migrazioni(&pool).await?;
    Ok(pool)
}
