// src/main.rs
use axum::serve;
use portale_danza::{config::Config, db, state::AppState, web};
use std::env;
use tokio::net::TcpListener;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| {
                    "portale_danza=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
                })
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Avvio del portale della scuola di danza...");

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Configurazione non valida: {}", e))?;

    // --- Database ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Inizializzazione del database fallita: {}", e);
            return Err(anyhow::anyhow!("Connessione/migrazione DB fallita: {}", e));
        }
    };

    // --- Sessioni ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Creazione dello store di sessione fallita: {}", e))?;
    session_store.migrate().await?;

    let store_pulizia = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = store_pulizia
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Errore nella pulizia delle sessioni scadute: {:?}", e);
        }
    });
    tracing::info!("🧹 Pulizia periodica delle sessioni avviata.");

    let indirizzo = config.indirizzo;
    tracing::info!(
        "📅 Scadenza mensilità il giorno {}, {} amministratori da lista email.",
        config.giorno_scadenza,
        config.admin_emails.len()
    );
    let app_state = AppState::new(db_pool, config);

    let listener = match TcpListener::bind(indirizzo).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Impossibile ascoltare su {}: {}", indirizzo, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Server in ascolto su http://{}", indirizzo);

    let app = web::routes::crea_app(app_state, session_store);

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Errore fatale del server: {}", e);
        return Err(e.into());
    }

    Ok(())
}
