// src/models/pagamento.rs
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::{fmt, ops::RangeInclusive, str::FromStr};

/// Anni accettati in ingresso, sia per i record sia per i filtri.
pub const ANNI_VALIDI: RangeInclusive<i32> = 1900..=9999;

pub fn valida_anno(anno: i32) -> AppResult<i32> {
    if ANNI_VALIDI.contains(&anno) {
        Ok(anno)
    } else {
        Err(AppError::DatiNonValidi(format!(
            "Anno fuori intervallo ({}-{}): {anno}",
            ANNI_VALIDI.start(),
            ANNI_VALIDI.end()
        )))
    }
}

/// Mesi nell'ordine dell'anno accademico (settembre = 0 … agosto = 11).
///
/// L'ordinamento derivato segue quindi l'anno accademico, non quello solare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Mese {
    Settembre,
    Ottobre,
    Novembre,
    Dicembre,
    Gennaio,
    Febbraio,
    Marzo,
    Aprile,
    Maggio,
    Giugno,
    Luglio,
    Agosto,
}

impl Mese {
    pub const ANNO_ACCADEMICO: [Mese; 12] = [
        Mese::Settembre,
        Mese::Ottobre,
        Mese::Novembre,
        Mese::Dicembre,
        Mese::Gennaio,
        Mese::Febbraio,
        Mese::Marzo,
        Mese::Aprile,
        Mese::Maggio,
        Mese::Giugno,
        Mese::Luglio,
        Mese::Agosto,
    ];

    pub fn indice_accademico(self) -> usize {
        self as usize
    }

    /// Numero del mese nel calendario solare (gennaio = 1).
    pub fn numero(self) -> u32 {
        // settembre (indice 0) -> 9, gennaio (indice 4) -> 1
        ((self.indice_accademico() as u32 + 8) % 12) + 1
    }

    /// Anno solare in cui cade il mese, dato l'anno accademico che inizia a settembre di `anno_accademico`.
    pub fn anno_solare(self, anno_accademico: i32) -> i32 {
        if self.numero() >= 9 {
            anno_accademico
        } else {
            anno_accademico.saturating_add(1)
        }
    }

    pub fn nome(self) -> &'static str {
        match self {
            Mese::Settembre => "settembre",
            Mese::Ottobre => "ottobre",
            Mese::Novembre => "novembre",
            Mese::Dicembre => "dicembre",
            Mese::Gennaio => "gennaio",
            Mese::Febbraio => "febbraio",
            Mese::Marzo => "marzo",
            Mese::Aprile => "aprile",
            Mese::Maggio => "maggio",
            Mese::Giugno => "giugno",
            Mese::Luglio => "luglio",
            Mese::Agosto => "agosto",
        }
    }
}

impl fmt::Display for Mese {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nome())
    }
}

impl FromStr for Mese {
    type Err = AppError;

    // Il confronto è case-insensitive: "Gennaio", "GENNAIO" e "gennaio" sono equivalenti
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cercato = s.trim();
        Self::ANNO_ACCADEMICO
            .into_iter()
            .find(|m| m.nome().eq_ignore_ascii_case(cercato))
            .ok_or_else(|| AppError::DatiNonValidi(format!("Mese non riconosciuto: '{s}'")))
    }
}

impl<'de> Deserialize<'de> for Mese {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let testo = String::deserialize(deserializer)?;
        testo.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Categoria {
    Mensile,
    Iscrizione,
    Saggio,
    Vestiti,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StatoPagamento {
    Pagato,
    NonPagato,
}

// Accetta sia l'enum testuale sia il vecchio formato booleano (true = pagato)
impl<'de> Deserialize<'de> for StatoPagamento {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Grezzo {
            Booleano(bool),
            Testo(String),
        }

        match Grezzo::deserialize(deserializer)? {
            Grezzo::Booleano(true) => Ok(StatoPagamento::Pagato),
            Grezzo::Booleano(false) => Ok(StatoPagamento::NonPagato),
            Grezzo::Testo(t) => match t.trim().to_lowercase().as_str() {
                "pagato" => Ok(StatoPagamento::Pagato),
                "non_pagato" | "non pagato" => Ok(StatoPagamento::NonPagato),
                altro => Err(serde::de::Error::custom(format!(
                    "stato di pagamento non valido: '{altro}'"
                ))),
            },
        }
    }
}

/// Un pagamento registrato per un allievo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Pagamento {
    pub id: String,
    pub utente_id: String,
    pub categoria: Categoria,
    pub mese: Option<Mese>,
    /// Anno solare del mese. Alcuni record storici ne sono privi.
    pub anno: Option<i32>,
    pub stato: StatoPagamento,
    pub importo: f64,
    pub note: Option<String>,
    pub data_pagamento: Option<NaiveDate>,
    pub creato_il: DateTime<Utc>,
    pub aggiornato_il: DateTime<Utc>,
}

impl Pagamento {
    pub fn pagato(&self) -> bool {
        self.stato == StatoPagamento::Pagato
    }

    pub fn mensile(&self) -> bool {
        self.categoria == Categoria::Mensile
    }
}

fn stato_predefinito() -> StatoPagamento {
    StatoPagamento::NonPagato
}

fn valida_importo(importo: f64) -> AppResult<()> {
    if !importo.is_finite() || importo < 0.0 {
        return Err(AppError::DatiNonValidi(format!("Importo non valido: {importo}")));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuovoPagamento {
    pub utente_id: String,
    pub categoria: Categoria,
    #[serde(default)]
    pub mese: Option<Mese>,
    #[serde(default)]
    pub anno: Option<i32>,
    #[serde(default = "stato_predefinito")]
    pub stato: StatoPagamento,
    pub importo: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub data_pagamento: Option<NaiveDate>,
}

impl NuovoPagamento {
    pub fn valida(&self) -> AppResult<()> {
        valida_importo(self.importo)?;
        if let Some(anno) = self.anno {
            valida_anno(anno)?;
        }
        if self.categoria == Categoria::Mensile && (self.mese.is_none() || self.anno.is_none()) {
            return Err(AppError::DatiNonValidi(
                "Una mensilità richiede mese e anno.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModificaPagamento {
    pub categoria: Option<Categoria>,
    pub mese: Option<Mese>,
    pub anno: Option<i32>,
    pub stato: Option<StatoPagamento>,
    pub importo: Option<f64>,
    pub note: Option<String>,
    pub data_pagamento: Option<NaiveDate>,
}

impl ModificaPagamento {
    pub fn applica(self, pagamento: &mut Pagamento) -> AppResult<()> {
        if let Some(importo) = self.importo {
            valida_importo(importo)?;
            pagamento.importo = importo;
        }
        if let Some(categoria) = self.categoria {
            pagamento.categoria = categoria;
        }
        if let Some(mese) = self.mese {
            pagamento.mese = Some(mese);
        }
        if let Some(anno) = self.anno {
            pagamento.anno = Some(valida_anno(anno)?);
        }
        if let Some(stato) = self.stato {
            pagamento.stato = stato;
        }
        if self.note.is_some() {
            pagamento.note = self.note;
        }
        if self.data_pagamento.is_some() {
            pagamento.data_pagamento = self.data_pagamento;
        }
        if pagamento.mensile() && (pagamento.mese.is_none() || pagamento.anno.is_none()) {
            return Err(AppError::DatiNonValidi(
                "Una mensilità richiede mese e anno.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Richiesta di upsert di una quota identificata da (allievo, mese, anno, categoria).
#[derive(Debug, Clone, Deserialize)]
pub struct Mensilita {
    pub utente_id: String,
    pub mese: Mese,
    pub anno: i32,
    #[serde(default = "categoria_mensile")]
    pub categoria: Categoria,
    pub stato: StatoPagamento,
    pub importo: f64,
    #[serde(default)]
    pub data_pagamento: Option<NaiveDate>,
}

fn categoria_mensile() -> Categoria {
    Categoria::Mensile
}

impl Mensilita {
    pub fn valida(&self) -> AppResult<()> {
        valida_importo(self.importo)?;
        valida_anno(self.anno)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroPagamenti {
    pub utente_id: Option<String>,
    /// Anno accademico: include i record con anno `Y`, `Y+1` o privi di anno.
    pub anno: Option<i32>,
    pub mese: Option<Mese>,
    pub categoria: Option<Categoria>,
    pub stato: Option<StatoPagamento>,
}

impl FiltroPagamenti {
    pub fn valida(&self) -> AppResult<()> {
        if let Some(anno) = self.anno {
            valida_anno(anno)?;
        }
        Ok(())
    }
}
