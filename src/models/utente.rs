// src/models/utente.rs
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Numero massimo di corsi assegnabili a un allievo.
pub const MAX_CORSI: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Ruolo {
    Allievo,
    Genitore,
    Admin,
    Insegnante,
}

impl Default for Ruolo {
    fn default() -> Self {
        Ruolo::Allievo
    }
}

// Riga della tabella 'utenti'
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Utente {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub nome: String,
    pub cognome: String,
    pub ruolo: Ruolo,
    pub genitore_id: Option<String>,
    pub data_iscrizione: Option<NaiveDate>,
    pub corso_1: Option<String>,
    pub prezzo_corso1: Option<f64>,
    pub corso_2: Option<String>,
    pub prezzo_corso2: Option<f64>,
    pub corso_3: Option<String>,
    pub prezzo_corso3: Option<f64>,
    pub corso_4: Option<String>,
    pub prezzo_corso4: Option<f64>,
    pub corso_5: Option<String>,
    pub prezzo_corso5: Option<f64>,
    pub creato_il: DateTime<Utc>,
    pub aggiornato_il: DateTime<Utc>,
}

/// Un corso assegnato all'allievo con la sua quota mensile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsoAssegnato {
    pub corso_id: String,
    #[serde(default)]
    pub prezzo: f64,
}

impl Utente {
    pub fn nome_completo(&self) -> String {
        format!("{} {}", self.nome, self.cognome).trim().to_string()
    }

    /// Slot `corso_N` valorizzati, nell'ordine in cui sono salvati.
    pub fn corsi_assegnati(&self) -> Vec<CorsoAssegnato> {
        let slot = [
            (&self.corso_1, self.prezzo_corso1),
            (&self.corso_2, self.prezzo_corso2),
            (&self.corso_3, self.prezzo_corso3),
            (&self.corso_4, self.prezzo_corso4),
            (&self.corso_5, self.prezzo_corso5),
        ];

        slot.into_iter()
            .filter_map(|(corso, prezzo)| {
                let id = corso.as_deref()?.trim();
                if id.is_empty() {
                    return None;
                }
                Some(CorsoAssegnato {
                    corso_id: id.to_string(),
                    prezzo: prezzo.unwrap_or(0.0),
                })
            })
            .collect()
    }

    pub fn imposta_corsi(&mut self, corsi: &[CorsoAssegnato]) -> AppResult<()> {
        valida_corsi(corsi)?;

        let mut slot: [(Option<String>, Option<f64>); MAX_CORSI] = Default::default();
        for (i, corso) in corsi.iter().enumerate() {
            slot[i] = (Some(corso.corso_id.clone()), Some(corso.prezzo));
        }
        let [s1, s2, s3, s4, s5] = slot;
        (self.corso_1, self.prezzo_corso1) = s1;
        (self.corso_2, self.prezzo_corso2) = s2;
        (self.corso_3, self.prezzo_corso3) = s3;
        (self.corso_4, self.prezzo_corso4) = s4;
        (self.corso_5, self.prezzo_corso5) = s5;
        Ok(())
    }

    pub fn frequenta(&self, corso_id: &str) -> bool {
        self.corsi_assegnati().iter().any(|c| c.corso_id == corso_id)
    }

    /// Ricerca testuale case-insensitive su nome, cognome ed email.
    pub fn corrisponde_ricerca(&self, termine: &str) -> bool {
        let termine = termine.trim().to_lowercase();
        if termine.is_empty() {
            return true;
        }
        [&self.nome, &self.cognome, &self.email]
            .iter()
            .any(|campo| campo.to_lowercase().contains(&termine))
            || self.nome_completo().to_lowercase().contains(&termine)
    }
}

fn valida_corsi(corsi: &[CorsoAssegnato]) -> AppResult<()> {
    if corsi.len() > MAX_CORSI {
        return Err(AppError::DatiNonValidi(format!(
            "Un allievo può frequentare al massimo {MAX_CORSI} corsi."
        )));
    }
    if corsi.iter().any(|c| c.corso_id.trim().is_empty()) {
        return Err(AppError::DatiNonValidi("Corso senza identificativo.".to_string()));
    }
    if corsi.iter().any(|c| !c.prezzo.is_finite() || c.prezzo < 0.0) {
        return Err(AppError::DatiNonValidi("Prezzo del corso non valido.".to_string()));
    }
    Ok(())
}

fn valida_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((utente, dominio)) if !utente.is_empty() && dominio.contains('.') => Ok(()),
        _ => Err(AppError::DatiNonValidi(format!("Email non valida: '{email}'"))),
    }
}

fn valida_password(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::DatiNonValidi(
            "La password deve avere almeno 8 caratteri.".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuovoUtente {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub nome: String,
    #[serde(default)]
    pub cognome: String,
    #[serde(default)]
    pub ruolo: Ruolo,
    #[serde(default)]
    pub genitore_id: Option<String>,
    #[serde(default)]
    pub data_iscrizione: Option<NaiveDate>,
    #[serde(default)]
    pub corsi: Vec<CorsoAssegnato>,
}

impl NuovoUtente {
    pub fn valida(&self) -> AppResult<()> {
        valida_email(&self.email)?;
        if self.nome.trim().is_empty() {
            return Err(AppError::DatiNonValidi("Il nome è obbligatorio.".to_string()));
        }
        if let Some(password) = &self.password {
            valida_password(password)?;
        }
        valida_corsi(&self.corsi)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModificaUtente {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nome: Option<String>,
    pub cognome: Option<String>,
    pub ruolo: Option<Ruolo>,
    pub genitore_id: Option<String>,
    pub data_iscrizione: Option<NaiveDate>,
    /// Sostituisce interamente gli slot dei corsi.
    pub corsi: Option<Vec<CorsoAssegnato>>,
}

impl ModificaUtente {
    /// Applica i campi presenti. La password viene gestita a parte (hash).
    pub fn applica(self, utente: &mut Utente) -> AppResult<()> {
        if let Some(email) = self.email {
            valida_email(&email)?;
            utente.email = email.trim().to_string();
        }
        if let Some(password) = &self.password {
            valida_password(password)?;
        }
        if let Some(nome) = self.nome {
            if nome.trim().is_empty() {
                return Err(AppError::DatiNonValidi("Il nome è obbligatorio.".to_string()));
            }
            utente.nome = nome;
        }
        if let Some(cognome) = self.cognome {
            utente.cognome = cognome;
        }
        if let Some(ruolo) = self.ruolo {
            utente.ruolo = ruolo;
        }
        if let Some(genitore_id) = self.genitore_id {
            // Stringa vuota = scollega il genitore
            utente.genitore_id = Some(genitore_id).filter(|g| !g.trim().is_empty());
        }
        if self.data_iscrizione.is_some() {
            utente.data_iscrizione = self.data_iscrizione;
        }
        if let Some(corsi) = self.corsi {
            utente.imposta_corsi(&corsi)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroUtenti {
    pub ruolo: Option<Ruolo>,
    pub genitore_id: Option<String>,
    pub corso_id: Option<String>,
    pub ricerca: Option<String>,
}

// Dati del login (JSON)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}
