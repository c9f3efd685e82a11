// src/web/auth_handlers.rs
use crate::{
    archivio::Collezione,
    error::{AppError, AppResult},
    models::utente::{LoginForm, Utente},
    services::{
        auth_service,
        capacita::{self, Capacita, CHIAVE_SESSIONE},
    },
    state::AppState,
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tower_sessions::Session;

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<Capacita>> {
    // --- Verifica delle credenziali ---
    let utente =
        auth_service::autentica(state.archivio.utenti.as_ref(), &form.email, &form.password)
            .await?;

    // I permessi si calcolano qui una volta sola e restano nella sessione
    let capacita =
        capacita::risolvi(state.archivio.utenti.as_ref(), &utente, &state.config.admin_emails)
            .await?;

    // --- Nuovo id di sessione, poi salvataggio della Capacita ---
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Rotazione id fallita: {e}")))?;
    session
        .insert(CHIAVE_SESSIONE, &capacita)
        .await
        .map_err(|e| AppError::SessionError(format!("Scrittura sessione fallita: {e}")))?;

    tracing::info!("🔑 Sessione aperta per {} (admin: {}).", utente.id, capacita.amministratore);
    Ok(Json(capacita))
}

// POST /logout
pub async fn handle_logout(session: Session) -> AppResult<StatusCode> {
    // Letta solo per il log, prima di eliminare la sessione
    let capacita: Option<Capacita> = session.get(CHIAVE_SESSIONE).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Eliminazione sessione fallita: {e}")))?;

    match capacita {
        Some(c) => tracing::info!("🚪 Utente '{}' disconnesso.", c.utente_id),
        None => tracing::info!("🚪 Sessione anonima chiusa."),
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct Profilo {
    pub utente: Utente,
    pub capacita: Capacita,
}

// GET /me
pub async fn handle_me(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
) -> AppResult<Json<Profilo>> {
    let utente = state
        .archivio
        .utenti
        .trova(&capacita.utente_id)
        .await?
        .ok_or_else(|| {
            // La sessione sopravvive all'account: va rifatto il login
            tracing::warn!("Utente di sessione '{}' non più presente.", capacita.utente_id);
            AppError::NonAutenticato
        })?;

    Ok(Json(Profilo { utente, capacita }))
}
