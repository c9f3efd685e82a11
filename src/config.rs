// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr};

/// Giorno del mese oltre il quale una mensilità non pagata risulta scaduta.
pub const GIORNO_SCADENZA_PREDEFINITO: u32 = 10;

/// Durata predefinita della sessione inattiva, in giorni.
pub const SESSIONE_GIORNI_PREDEFINITI: i64 = 1;

/// Configurazione letta dall'ambiente (e da `.env`, se presente).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub indirizzo: SocketAddr,
    /// Email che ottengono i privilegi di amministratore anche senza ruolo `admin` nel profilo.
    pub admin_emails: Vec<String>,
    pub giorno_scadenza: u32,
    pub sessione_giorni: i64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let indirizzo = env::var("INDIRIZZO")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::ConfigError(format!("INDIRIZZO non valido: {e}")))?;

        let admin_emails = env::var("ADMIN_EMAILS")
            .map(|s| parse_lista_email(&s))
            .unwrap_or_default();

        let giorno_scadenza = match env::var("GIORNO_SCADENZA") {
            Ok(valore) => parse_giorno_scadenza(&valore)?,
            Err(_) => GIORNO_SCADENZA_PREDEFINITO,
        };

        let sessione_giorni = match env::var("SESSIONE_GIORNI") {
            Ok(valore) => parse_sessione_giorni(&valore)?,
            Err(_) => SESSIONE_GIORNI_PREDEFINITI,
        };

        Ok(Self {
            database_url,
            indirizzo,
            admin_emails,
            giorno_scadenza,
            sessione_giorni,
        })
    }
}

fn parse_lista_email(valore: &str) -> Vec<String> {
    valore
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn parse_giorno_scadenza(valore: &str) -> AppResult<u32> {
    match valore.trim().parse::<u32>() {
        // 28 è l'ultimo giorno presente in ogni mese
        Ok(giorno) if (1..=28).contains(&giorno) => Ok(giorno),
        _ => Err(AppError::ConfigError(format!(
            "GIORNO_SCADENZA deve essere un numero tra 1 e 28, ricevuto '{valore}'"
        ))),
    }
}

fn parse_sessione_giorni(valore: &str) -> AppResult<i64> {
    match valore.trim().parse::<i64>() {
        Ok(giorni) if (1..=365).contains(&giorni) => Ok(giorni),
        _ => Err(AppError::ConfigError(format!(
            "SESSIONE_GIORNI deve essere un numero tra 1 e 365, ricevuto '{valore}'"
        ))),
    }
}
