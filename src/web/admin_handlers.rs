// src/web/admin_handlers.rs
use crate::{
    archivio::Collezione,
    error::AppResult,
    models::{
        corso::{Corso, ModificaCorso, NuovoCorso},
        utente::{FiltroUtenti, ModificaUtente, NuovoUtente, Utente},
    },
    services::capacita::Capacita,
    state::AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

// --- Utenti ---

pub async fn lista_utenti(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroUtenti>,
) -> AppResult<Json<Vec<Utente>>> {
    tracing::debug!("GET /admin/utenti: {:?}", filtro);
    let utenti = state.archivio.utenti.elenca(&filtro).await?;
    Ok(Json(utenti))
}

pub async fn dettaglio_utente(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Utente>> {
    Ok(Json(state.archivio.utenti.ottieni(&id).await?))
}

pub async fn crea_utente(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
    Json(nuovo): Json<NuovoUtente>,
) -> AppResult<(StatusCode, Json<Utente>)> {
    tracing::info!("POST /admin/utenti da {}: {}", capacita.utente_id, nuovo.email);
    let utente = state.archivio.utenti.crea(nuovo).await?;
    Ok((StatusCode::CREATED, Json(utente)))
}

pub async fn modifica_utente(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(modifica): Json<ModificaUtente>,
) -> AppResult<Json<Utente>> {
    Ok(Json(state.archivio.utenti.aggiorna(&id, modifica).await?))
}

pub async fn elimina_utente(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    // Un amministratore non può togliersi l'accesso da solo
    if id == capacita.utente_id {
        return Err(crate::error::AppError::DatiNonValidi(
            "Non puoi eliminare il tuo stesso account.".to_string(),
        ));
    }
    state.archivio.utenti.elimina(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Corsi ---

pub async fn crea_corso(
    State(state): State<AppState>,
    Json(nuovo): Json<NuovoCorso>,
) -> AppResult<(StatusCode, Json<Corso>)> {
    let corso = state.archivio.corsi.crea(nuovo).await?;
    Ok((StatusCode::CREATED, Json(corso)))
}

pub async fn modifica_corso(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(modifica): Json<ModificaCorso>,
) -> AppResult<Json<Corso>> {
    Ok(Json(state.archivio.corsi.aggiorna(&id, modifica).await?))
}

pub async fn elimina_corso(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.archivio.corsi.elimina(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
