// src/web/annunci_handlers.rs
use crate::{
    archivio::Collezione,
    error::AppResult,
    models::annuncio::{Annuncio, FiltroAnnunci, ModificaAnnuncio, NuovoAnnuncio},
    services::capacita::Capacita,
    state::AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

// GET /annunci
pub async fn lista_annunci(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
    Query(mut filtro): Query<FiltroAnnunci>,
) -> AppResult<Json<Vec<Annuncio>>> {
    // Le bozze restano visibili solo agli amministratori
    if !capacita.amministratore {
        filtro.solo_pubblicati = true;
    }
    Ok(Json(state.archivio.annunci.elenca(&filtro).await?))
}

pub async fn crea_annuncio(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
    Json(mut nuovo): Json<NuovoAnnuncio>,
) -> AppResult<(StatusCode, Json<Annuncio>)> {
    // L'autore è sempre chi è in sessione, mai il corpo della richiesta
    nuovo.autore_id = Some(capacita.utente_id.clone());
    let annuncio = state.archivio.annunci.crea(nuovo).await?;
    tracing::info!("📢 Annuncio '{}' creato da {}.", annuncio.titolo, capacita.utente_id);
    Ok((StatusCode::CREATED, Json(annuncio)))
}

pub async fn modifica_annuncio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(modifica): Json<ModificaAnnuncio>,
) -> AppResult<Json<Annuncio>> {
    Ok(Json(state.archivio.annunci.aggiorna(&id, modifica).await?))
}

pub async fn elimina_annuncio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.archivio.annunci.elimina(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
