// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Errore nella base di dati: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Errore di migrazione della base di dati: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Errore di variabile d'ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Configurazione non valida: {0}")]
    ConfigError(String),

    #[error("Errore durante l'elaborazione della password")]
    PasswordHashingError,

    #[error("Credenziali non valide")]
    InvalidCredentials,

    #[error("Errore nella sessione: {0}")]
    SessionError(String),

    #[error("Dati non validi: {0}")]
    DatiNonValidi(String),

    #[error("{0} non trovato")]
    NonTrovato(&'static str),

    #[error("Conflitto: {0}")]
    Conflitto(String),

    #[error("Errore interno inatteso")]
    InternalServerError,

    // Nessuna sessione attiva
    #[error("Non autenticato")]
    NonAutenticato,

    // Sessione attiva ma capacità insufficienti
    #[error("Non autorizzato")]
    Unauthorized,
}

impl AppError {
    fn status_e_messaggio(&self) -> (StatusCode, String) {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore di accesso ai dati.".to_string(),
            ),
            AppError::EnvVarError(_) | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore di configurazione.".to_string(),
            ),
            AppError::PasswordHashingError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore durante l'elaborazione delle credenziali.".to_string(),
            ),
            // Messaggio generico: non riveliamo se l'email esiste
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Email o password non validi.".to_string(),
            ),
            AppError::SessionError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Errore nella gestione della sessione.".to_string(),
            ),
            AppError::DatiNonValidi(dettaglio) => (StatusCode::BAD_REQUEST, dettaglio.clone()),
            AppError::NonTrovato(cosa) => (StatusCode::NOT_FOUND, format!("{cosa} non trovato.")),
            AppError::Conflitto(dettaglio) => (StatusCode::CONFLICT, dettaglio.clone()),
            AppError::NonAutenticato => (
                StatusCode::UNAUTHORIZED,
                "Accesso richiesto.".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "Non hai i permessi per questa operazione.".to_string(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Si è verificato un errore inatteso.".to_string(),
            ),
        }
    }
}

// Conversione di AppError in una risposta HTTP JSON
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, messaggio) = self.status_e_messaggio();

        // I 5xx vengono loggati con il dettaglio, il client riceve solo il messaggio generico
        if status.is_server_error() {
            tracing::error!("Errore processato: {:?}", self);
        } else {
            tracing::debug!("Errore lato client ({}): {}", status.as_u16(), self);
        }

        (status, Json(json!({ "errore": messaggio }))).into_response()
    }
}

// Tipo Result standard dell'applicazione
pub type AppResult<T = ()> = Result<T, AppError>;
