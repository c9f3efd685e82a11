// src/state.rs
use crate::{archivio::Archivio, config::Config, services::stato_pagamento::RegolaScadenza};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub archivio: Archivio,
    pub config: Arc<Config>,
    pub regola: RegolaScadenza,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            archivio: Archivio::sqlite(db_pool.clone()),
            regola: RegolaScadenza::new(config.giorno_scadenza),
            config: Arc::new(config),
            db_pool,
        }
    }
}

// Usato da /health per verificare la connessione al database
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}
