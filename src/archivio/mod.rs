// src/archivio/mod.rs
//! Accesso ai dati: un'unica interfaccia polimorfica per utenti, corsi,
//! pagamenti e annunci, con un backend SQLite.

mod annunci;
mod corsi;
mod pagamenti;
mod utenti;

use crate::{
    error::{AppError, AppResult},
    models::{
        annuncio::{Annuncio, FiltroAnnunci, ModificaAnnuncio, NuovoAnnuncio},
        corso::{Corso, FiltroCorsi, ModificaCorso, NuovoCorso},
        pagamento::{FiltroPagamenti, Mensilita, ModificaPagamento, NuovoPagamento, Pagamento},
        utente::{FiltroUtenti, ModificaUtente, NuovoUtente, Utente},
    },
};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, FromRow, SqlitePool};
use std::sync::Arc;

/// Un tipo di record con la sua collezione e i tipi di input associati.
pub trait Entita: Send + Sync + Unpin + 'static {
    type Filtro: Default + Send + Sync;
    type Nuovo: Send;
    type Modifica: Send;

    /// Nome della collezione (tabella).
    const COLLEZIONE: &'static str;
    /// Nome leggibile usato nei messaggi di errore.
    const NOME: &'static str;
}

impl Entita for Utente {
    type Filtro = FiltroUtenti;
    type Nuovo = NuovoUtente;
    type Modifica = ModificaUtente;
    const COLLEZIONE: &'static str = "utenti";
    const NOME: &'static str = "Utente";
}

impl Entita for Corso {
    type Filtro = FiltroCorsi;
    type Nuovo = NuovoCorso;
    type Modifica = ModificaCorso;
    const COLLEZIONE: &'static str = "corsi";
    const NOME: &'static str = "Corso";
}

impl Entita for Pagamento {
    type Filtro = FiltroPagamenti;
    type Nuovo = NuovoPagamento;
    type Modifica = ModificaPagamento;
    const COLLEZIONE: &'static str = "pagamenti";
    const NOME: &'static str = "Pagamento";
}

impl Entita for Annuncio {
    type Filtro = FiltroAnnunci;
    type Nuovo = NuovoAnnuncio;
    type Modifica = ModificaAnnuncio;
    const COLLEZIONE: &'static str = "annunci";
    const NOME: &'static str = "Annuncio";
}

/// Operazioni CRUD comuni a ogni collezione.
///
/// Le scritture impostano `creato_il`/`aggiornato_il` lato server. Gli errori
/// vengono propagati al chiamante senza tentativi ripetuti.
#[async_trait]
pub trait Collezione<E: Entita>: Send + Sync {
    async fn elenca(&self, filtro: &E::Filtro) -> AppResult<Vec<E>>;
    async fn trova(&self, id: &str) -> AppResult<Option<E>>;
    async fn crea(&self, nuovo: E::Nuovo) -> AppResult<E>;
    async fn aggiorna(&self, id: &str, modifica: E::Modifica) -> AppResult<E>;
    async fn elimina(&self, id: &str) -> AppResult<()>;

    /// Come `trova`, ma l'assenza del record è un errore.
    async fn ottieni(&self, id: &str) -> AppResult<E> {
        self.trova(id).await?.ok_or(AppError::NonTrovato(E::NOME))
    }
}

#[async_trait]
pub trait RepoUtenti: Collezione<Utente> {
    async fn trova_per_email(&self, email: &str) -> AppResult<Option<Utente>>;
}

#[async_trait]
pub trait RepoPagamenti: Collezione<Pagamento> {
    /// Inserisce o aggiorna la quota identificata da (allievo, mese, anno, categoria)
    /// con una singola scrittura condizionale.
    async fn registra_mensilita(&self, mensilita: Mensilita) -> AppResult<Pagamento>;
}

/// Backend SQLite di tutte le collezioni.
#[derive(Clone)]
pub struct ArchivioSqlite {
    pool: SqlitePool,
}

impl ArchivioSqlite {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn trova_record<E>(&self, id: &str) -> AppResult<Option<E>>
    where
        E: Entita + for<'r> FromRow<'r, SqliteRow>,
    {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", E::COLLEZIONE);
        let record = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn elimina_record<E: Entita>(&self, id: &str) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", E::COLLEZIONE);
        let rows_affected = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            tracing::warn!("Eliminazione fallita: {} '{}' non trovato.", E::NOME, id);
            return Err(AppError::NonTrovato(E::NOME));
        }
        tracing::info!("🗑️ {} '{}' eliminato.", E::NOME, id);
        Ok(())
    }
}

/// Handle alle collezioni condivisi nello stato dell'applicazione.
#[derive(Clone)]
pub struct Archivio {
    pub utenti: Arc<dyn RepoUtenti>,
    pub corsi: Arc<dyn Collezione<Corso>>,
    pub pagamenti: Arc<dyn RepoPagamenti>,
    pub annunci: Arc<dyn Collezione<Annuncio>>,
}

impl Archivio {
    pub fn sqlite(pool: SqlitePool) -> Self {
        let backend = Arc::new(ArchivioSqlite::new(pool));
        Self {
            utenti: backend.clone(),
            corsi: backend.clone(),
            pagamenti: backend.clone(),
            annunci: backend,
        }
    }
}

// Traduce una violazione di unicità in un conflitto leggibile
pub(crate) fn mappa_conflitto(e: sqlx::Error, messaggio: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflitto(messaggio.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::DatiNonValidi("Riferimento a un record inesistente.".to_string());
        }
    }
    AppError::SqlxError(e)
}

pub(crate) fn nuovo_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn pattern_ricerca(termine: &str) -> String {
    format!("%{}%", termine.trim().to_lowercase())
}
