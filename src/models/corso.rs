// src/models/corso.rs
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Corso {
    pub id: String,
    pub nome: String,
    pub descrizione: Option<String>,
    pub creato_il: DateTime<Utc>,
    pub aggiornato_il: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuovoCorso {
    #[serde(alias = "name")]
    pub nome: String,
    #[serde(default, alias = "description")]
    pub descrizione: Option<String>,
}

impl NuovoCorso {
    pub fn valida(&self) -> AppResult<()> {
        if self.nome.trim().is_empty() {
            return Err(AppError::DatiNonValidi(
                "Il nome del corso è obbligatorio.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModificaCorso {
    #[serde(alias = "name")]
    pub nome: Option<String>,
    #[serde(alias = "description")]
    pub descrizione: Option<String>,
}

impl ModificaCorso {
    pub fn applica(self, corso: &mut Corso) -> AppResult<()> {
        if let Some(nome) = self.nome {
            if nome.trim().is_empty() {
                return Err(AppError::DatiNonValidi(
                    "Il nome del corso è obbligatorio.".to_string(),
                ));
            }
            corso.nome = nome;
        }
        if self.descrizione.is_some() {
            corso.descrizione = self.descrizione;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroCorsi {
    pub ricerca: Option<String>,
}
