// src/web/allievo_handlers.rs
use crate::{
    archivio::Collezione,
    error::{AppError, AppResult},
    models::{
        corso::{Corso, FiltroCorsi},
        pagamento::{valida_anno, FiltroPagamenti},
    },
    services::{
        aggregatore::{self, ProspettoAnnuale},
        capacita::Capacita,
        stato_pagamento::anno_accademico_di,
    },
    state::AppState,
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ParametriProspetto {
    pub anno: Option<i32>,
}

// GET /corsi
pub async fn lista_corsi(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroCorsi>,
) -> AppResult<Json<Vec<Corso>>> {
    Ok(Json(state.archivio.corsi.elenca(&filtro).await?))
}

// GET /allievi/{id}/prospetto?anno=
pub async fn prospetto_allievo(
    State(state): State<AppState>,
    Extension(capacita): Extension<Capacita>,
    Path(id): Path<String>,
    Query(parametri): Query<ParametriProspetto>,
) -> AppResult<Json<ProspettoAnnuale>> {
    if !capacita.puo_vedere_allievo(&id) {
        tracing::warn!("{} ha chiesto il prospetto di {} senza permesso.", capacita.utente_id, id);
        return Err(AppError::Unauthorized);
    }

    // Anno richiesto oppure quello in corso
    let oggi = chrono::Local::now().date_naive();
    let anno_accademico = match parametri.anno {
        Some(anno) => valida_anno(anno)?,
        None => anno_accademico_di(oggi),
    };

    // --- Dati dell'allievo, pagamenti dell'anno e catalogo corsi ---
    let allievo = state.archivio.utenti.ottieni(&id).await?;
    let filtro = FiltroPagamenti {
        utente_id: Some(id),
        anno: Some(anno_accademico),
        ..Default::default()
    };
    let pagamenti = state.archivio.pagamenti.elenca(&filtro).await?;
    let catalogo = state.archivio.corsi.elenca(&FiltroCorsi::default()).await?;

    let prospetto = aggregatore::prospetto_annuale(
        &allievo,
        &pagamenti,
        &catalogo,
        anno_accademico,
        &state.regola,
        oggi,
    );
    Ok(Json(prospetto))
}
