// src/web/pagamenti_handlers.rs
use crate::{
    archivio::Collezione,
    error::AppResult,
    models::{
        corso::FiltroCorsi,
        pagamento::{
            FiltroPagamenti, Mensilita, ModificaPagamento, NuovoPagamento, Pagamento,
            StatoPagamento,
        },
        utente::{FiltroUtenti, Ruolo},
    },
    services::{
        aggregatore::{self, FiltriReport, Riepilogo},
        stato_pagamento::anno_accademico_di,
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::collections::HashMap;

pub async fn lista_pagamenti(
    State(state): State<AppState>,
    Query(filtro): Query<FiltroPagamenti>,
) -> AppResult<Json<Vec<Pagamento>>> {
    tracing::debug!("GET /admin/pagamenti: {:?}", filtro);
    Ok(Json(state.archivio.pagamenti.elenca(&filtro).await?))
}

pub async fn dettaglio_pagamento(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Pagamento>> {
    Ok(Json(state.archivio.pagamenti.ottieni(&id).await?))
}

pub async fn crea_pagamento(
    State(state): State<AppState>,
    Json(nuovo): Json<NuovoPagamento>,
) -> AppResult<(StatusCode, Json<Pagamento>)> {
    let pagamento = state.archivio.pagamenti.crea(nuovo).await?;
    Ok((StatusCode::CREATED, Json(pagamento)))
}

pub async fn modifica_pagamento(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(modifica): Json<ModificaPagamento>,
) -> AppResult<Json<Pagamento>> {
    Ok(Json(state.archivio.pagamenti.aggiorna(&id, modifica).await?))
}

pub async fn elimina_pagamento(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.archivio.pagamenti.elimina(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /admin/pagamenti/mensilita
pub async fn registra_mensilita(
    State(state): State<AppState>,
    Json(mut mensilita): Json<Mensilita>,
) -> AppResult<Json<Pagamento>> {
    // Una quota segnata come pagata senza data prende quella di oggi
    if mensilita.stato == StatoPagamento::Pagato && mensilita.data_pagamento.is_none() {
        mensilita.data_pagamento = Some(chrono::Local::now().date_naive());
    }
    Ok(Json(state.archivio.pagamenti.registra_mensilita(mensilita).await?))
}

// GET /admin/report
pub async fn report(
    State(state): State<AppState>,
    Query(filtri): Query<FiltriReport>,
) -> AppResult<Json<Riepilogo>> {
    tracing::debug!("GET /admin/report: {:?}", filtri);
    filtri.valida()?;

    let oggi = chrono::Local::now().date_naive();
    let anno_corrente = anno_accademico_di(oggi);

    // Prefiltro lato database, il resto lo applica l'aggregatore
    let filtro_db = FiltroPagamenti {
        anno: filtri.anno,
        mese: filtri.mese,
        categoria: filtri.categoria,
        ..Default::default()
    };
    let pagamenti = state.archivio.pagamenti.elenca(&filtro_db).await?;

    // L'anagrafica serve solo per i filtri per corso o per nome
    let allievi: HashMap<_, _> = if filtri.corso.is_some() || filtri.ricerca.is_some() {
        let filtro_allievi = FiltroUtenti {
            ruolo: Some(Ruolo::Allievo),
            ..Default::default()
        };
        state
            .archivio
            .utenti
            .elenca(&filtro_allievi)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect()
    } else {
        HashMap::new()
    };

    let riepilogo = aggregatore::aggrega(
        &pagamenti,
        &allievi,
        &filtri,
        anno_corrente,
        &state.regola,
        oggi,
    );
    tracing::info!(
        "📊 Report: {} pagamenti, incassato {:.2}, da incassare {:.2}, scaduto {:.2}",
        riepilogo.numero_pagamenti,
        riepilogo.totale_pagato,
        riepilogo.totale_non_incassato,
        riepilogo.totale_scaduto
    );
    Ok(Json(riepilogo))
}

// GET /admin/quote: quota mensile attesa per ogni allievo in base ai corsi del catalogo
pub async fn quote_allievi(State(state): State<AppState>) -> AppResult<Json<Vec<QuotaAllievo>>> {
    let catalogo = state.archivio.corsi.elenca(&FiltroCorsi::default()).await?;
    let filtro = FiltroUtenti {
        ruolo: Some(Ruolo::Allievo),
        ..Default::default()
    };
    let quote = state
        .archivio
        .utenti
        .elenca(&filtro)
        .await?
        .iter()
        .map(|allievo| QuotaAllievo {
            utente_id: allievo.id.clone(),
            nome: allievo.nome_completo(),
            corsi: aggregatore::quote_corsi(allievo, &catalogo),
            quota_mensile: aggregatore::quota_mensile(allievo, &catalogo),
        })
        .collect();
    Ok(Json(quote))
}

#[derive(Debug, serde::Serialize)]
pub struct QuotaAllievo {
    pub utente_id: String,
    pub nome: String,
    pub corsi: Vec<aggregatore::QuotaCorso>,
    pub quota_mensile: f64,
}
