// src/web/mw_auth.rs
use crate::{
    error::AppError,
    services::capacita::{Capacita, CHIAVE_SESSIONE},
};
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

/// Verifica che esista una sessione e rende disponibile la `Capacita`
/// calcolata al login come estensione della richiesta.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<Capacita>(CHIAVE_SESSIONE).await {
        Ok(Some(capacita)) => {
            tracing::debug!("Auth MW: utente '{}' autenticato.", capacita.utente_id);
            request.extensions_mut().insert(capacita);
            Ok(next.run(request).await)
        }
        Ok(None) => {
            tracing::debug!("Auth MW: nessuna sessione attiva.");
            Err(AppError::NonAutenticato)
        }
        Err(e) => {
            tracing::error!("Auth MW: errore nella lettura della sessione: {:?}", e);
            Err(AppError::SessionError(format!("Errore nella verifica della sessione: {e}")))
        }
    }
}
