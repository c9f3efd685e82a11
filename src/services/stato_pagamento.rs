// src/services/stato_pagamento.rs
use crate::{
    config::GIORNO_SCADENZA_PREDEFINITO,
    models::pagamento::{Categoria, Mese, Pagamento},
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Stato di una mensilità come viene mostrato all'utente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatoMensile {
    Pagato,
    NonPagato,
    Scaduto,
    NonDovuto,
}

/// Regola di scadenza delle mensilità: oltre il giorno `giorno` del mese la quota è scaduta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegolaScadenza {
    pub giorno: u32,
}

impl Default for RegolaScadenza {
    fn default() -> Self {
        Self {
            giorno: GIORNO_SCADENZA_PREDEFINITO,
        }
    }
}

/// Anno accademico (anno di settembre) a cui appartiene la data.
pub fn anno_accademico_di(data: NaiveDate) -> i32 {
    if data.month() >= 9 {
        data.year()
    } else {
        data.year() - 1
    }
}

impl RegolaScadenza {
    pub fn new(giorno: u32) -> Self {
        Self { giorno }
    }

    /// Data limite per il pagamento del mese nell'anno solare indicato.
    pub fn scadenza(&self, mese: Mese, anno_solare: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(anno_solare, mese.numero(), self.giorno)
    }

    /// Il mese è scaduto se è già trascorso per intero, oppure se è il mese
    /// corrente e il giorno è successivo a quello di scadenza.
    pub fn scaduto(&self, mese: Mese, anno_solare: i32, oggi: NaiveDate) -> bool {
        match self.scadenza(mese, anno_solare) {
            Some(limite) => oggi > limite,
            None => false,
        }
    }

    /// Deriva lo stato di visualizzazione della mensilità `mese` dell'anno accademico `anno_accademico`.
    pub fn risolvi(
        &self,
        record: Option<&Pagamento>,
        mese: Mese,
        anno_accademico: i32,
        oggi: NaiveDate,
    ) -> StatoMensile {
        let Some(pagamento) = record else {
            return StatoMensile::NonDovuto;
        };
        if pagamento.pagato() {
            return StatoMensile::Pagato;
        }
        if self.scaduto(mese, mese.anno_solare(anno_accademico), oggi) {
            StatoMensile::Scaduto
        } else {
            StatoMensile::NonPagato
        }
    }

    /// Stato di un singolo record mensile, usando il suo anno se presente.
    ///
    /// Un record senza anno viene collocato nell'anno accademico di riferimento.
    pub fn risolvi_record(
        &self,
        pagamento: &Pagamento,
        anno_accademico: i32,
        oggi: NaiveDate,
    ) -> Option<StatoMensile> {
        let mese = pagamento.mese?;
        if pagamento.pagato() {
            return Some(StatoMensile::Pagato);
        }
        let anno_solare = pagamento
            .anno
            .unwrap_or_else(|| mese.anno_solare(anno_accademico));
        if self.scaduto(mese, anno_solare, oggi) {
            Some(StatoMensile::Scaduto)
        } else {
            Some(StatoMensile::NonPagato)
        }
    }
}

/// Cerca il record mensile per `mese` nell'anno accademico `anno_accademico`.
///
/// Un record privo di `anno` è considerato appartenente all'anno visualizzato.
pub fn trova_mensilita<'a>(
    pagamenti: &'a [Pagamento],
    mese: Mese,
    anno_accademico: i32,
) -> Option<&'a Pagamento> {
    let anno_solare = mese.anno_solare(anno_accademico);
    let candidati = pagamenti
        .iter()
        .filter(|p| p.categoria == Categoria::Mensile && p.mese == Some(mese));

    // Un record con l'anno esatto ha la precedenza su uno senza anno
    let mut senza_anno = None;
    for p in candidati {
        match p.anno {
            Some(anno) if anno == anno_solare => return Some(p),
            None if senza_anno.is_none() => senza_anno = Some(p),
            _ => {}
        }
    }
    senza_anno
}
