// src/models/annuncio.rs
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Annuncio {
    pub id: String,
    #[serde(alias = "title")]
    pub titolo: String,
    #[serde(alias = "content", alias = "body")]
    pub contenuto: String,
    #[serde(alias = "published")]
    pub pubblicato: bool,
    pub autore_id: Option<String>,
    #[serde(alias = "created_at", alias = "createdAt")]
    pub creato_il: DateTime<Utc>,
    #[serde(alias = "updated_at", alias = "updatedAt")]
    pub aggiornato_il: DateTime<Utc>,
}

// Gli alias coprono le convenzioni di nomi usate storicamente dai client
#[derive(Debug, Clone, Deserialize)]
pub struct NuovoAnnuncio {
    #[serde(alias = "title")]
    pub titolo: String,
    #[serde(default, alias = "content", alias = "body", alias = "testo")]
    pub contenuto: String,
    #[serde(default, alias = "published")]
    pub pubblicato: bool,
    /// Impostato dal server con l'autore della sessione.
    #[serde(skip)]
    pub autore_id: Option<String>,
}

impl NuovoAnnuncio {
    pub fn valida(&self) -> AppResult<()> {
        if self.titolo.trim().is_empty() {
            return Err(AppError::DatiNonValidi("Il titolo è obbligatorio.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModificaAnnuncio {
    #[serde(alias = "title")]
    pub titolo: Option<String>,
    #[serde(alias = "content", alias = "body", alias = "testo")]
    pub contenuto: Option<String>,
    #[serde(alias = "published")]
    pub pubblicato: Option<bool>,
}

impl ModificaAnnuncio {
    pub fn applica(self, annuncio: &mut Annuncio) -> AppResult<()> {
        if let Some(titolo) = self.titolo {
            if titolo.trim().is_empty() {
                return Err(AppError::DatiNonValidi("Il titolo è obbligatorio.".to_string()));
            }
            annuncio.titolo = titolo;
        }
        if let Some(contenuto) = self.contenuto {
            annuncio.contenuto = contenuto;
        }
        if let Some(pubblicato) = self.pubblicato {
            annuncio.pubblicato = pubblicato;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroAnnunci {
    #[serde(default)]
    pub solo_pubblicati: bool,
    pub limite: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nuovo_annuncio_accetta_nomi_storici() {
        let a: NuovoAnnuncio = serde_json::from_value(serde_json::json!({
            "title": "Saggio di fine anno",
            "body": "Il saggio si terrà il 14 giugno.",
            "published": true
        }))
        .unwrap();
        assert_eq!(a.titolo, "Saggio di fine anno");
        assert_eq!(a.contenuto, "Il saggio si terrà il 14 giugno.");
        assert!(a.pubblicato);
        assert!(a.autore_id.is_none());
    }

    #[test]
    fn titolo_vuoto_rifiutato() {
        let a: NuovoAnnuncio = serde_json::from_value(serde_json::json!({ "titolo": "  " })).unwrap();
        assert!(a.valida().is_err());
    }
}
