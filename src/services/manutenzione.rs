// src/services/manutenzione.rs
use crate::{
    archivio::{Collezione, RepoUtenti},
    error::{AppError, AppResult},
    models::utente::{ModificaUtente, Ruolo, Utente},
};
use sqlx::SqlitePool;

/// Collezioni che possono essere svuotate dallo strumento di manutenzione.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CollezioneSvuotabile {
    Utenti,
    Corsi,
    Pagamenti,
    Annunci,
}

impl CollezioneSvuotabile {
    pub fn tabella(self) -> &'static str {
        match self {
            CollezioneSvuotabile::Utenti => "utenti",
            CollezioneSvuotabile::Corsi => "corsi",
            CollezioneSvuotabile::Pagamenti => "pagamenti",
            CollezioneSvuotabile::Annunci => "annunci",
        }
    }
}

pub async fn conta(pool: &SqlitePool, collezione: CollezioneSvuotabile) -> AppResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", collezione.tabella());
    let totale: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(totale)
}

/// Elimina tutti i record della collezione a blocchi di `dimensione_blocco`.
/// Restituisce il numero di record eliminati.
pub async fn svuota_a_blocchi(
    pool: &SqlitePool,
    collezione: CollezioneSvuotabile,
    dimensione_blocco: u32,
) -> AppResult<u64> {
    if dimensione_blocco == 0 {
        return Err(AppError::DatiNonValidi(
            "La dimensione del blocco deve essere maggiore di zero.".to_string(),
        ));
    }

    let tabella = collezione.tabella();
    let sql = format!(
        "DELETE FROM {tabella} WHERE rowid IN (SELECT rowid FROM {tabella} LIMIT ?1)"
    );

    let mut eliminati = 0u64;
    loop {
        let blocco = sqlx::query(&sql)
            .bind(i64::from(dimensione_blocco))
            .execute(pool)
            .await?
            .rows_affected();
        if blocco == 0 {
            break;
        }
        eliminati += blocco;
        tracing::info!("🗑️ {}: eliminati {} record (totale {}).", tabella, blocco, eliminati);
    }

    Ok(eliminati)
}

/// Come identificare l'account da promuovere.
#[derive(Debug, Clone)]
pub enum Destinatario {
    Email(String),
    Id(String),
}

/// Assegna il ruolo di amministratore a un account esistente.
pub async fn promuovi_amministratore(
    utenti: &dyn RepoUtenti,
    destinatario: &Destinatario,
) -> AppResult<Utente> {
    let utente = match destinatario {
        Destinatario::Email(email) => utenti.trova_per_email(email).await?,
        Destinatario::Id(id) => utenti.trova(id).await?,
    }
    .ok_or(AppError::NonTrovato("Utente"))?;

    if utente.ruolo == Ruolo::Admin {
        tracing::info!("L'utente {} è già amministratore.", utente.email);
        return Ok(utente);
    }

    let modifica = ModificaUtente {
        ruolo: Some(Ruolo::Admin),
        ..Default::default()
    };
    let promosso = utenti.aggiorna(&utente.id, modifica).await?;
    tracing::info!("✅ {} ora è amministratore.", promosso.email);
    Ok(promosso)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archivio::Archivio,
        db::pool_in_memoria,
        models::annuncio::NuovoAnnuncio,
        models::utente::NuovoUtente,
    };

    #[tokio::test]
    async fn svuota_a_blocchi_elimina_tutto() {
        let pool = pool_in_memoria().await.unwrap();
        let archivio = Archivio::sqlite(pool.clone());
        for i in 0..7 {
            archivio
                .annunci
                .crea(NuovoAnnuncio {
                    titolo: format!("Annuncio {i}"),
                    contenuto: String::new(),
                    pubblicato: true,
                    autore_id: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(conta(&pool, CollezioneSvuotabile::Annunci).await.unwrap(), 7);
        let eliminati = svuota_a_blocchi(&pool, CollezioneSvuotabile::Annunci, 3)
            .await
            .unwrap();
        assert_eq!(eliminati, 7);
        assert_eq!(conta(&pool, CollezioneSvuotabile::Annunci).await.unwrap(), 0);

        assert!(svuota_a_blocchi(&pool, CollezioneSvuotabile::Annunci, 0).await.is_err());
    }

    #[tokio::test]
    async fn promuove_per_email_e_per_id() {
        let archivio = Archivio::sqlite(pool_in_memoria().await.unwrap());
        let u = archivio
            .utenti
            .crea(NuovoUtente {
                email: "insegnante@scuola.it".into(),
                password: None,
                nome: "Paola".into(),
                cognome: "Ferri".into(),
                ruolo: Ruolo::Insegnante,
                genitore_id: None,
                data_iscrizione: None,
                corsi: vec![],
            })
            .await
            .unwrap();

        let promosso = promuovi_amministratore(
            archivio.utenti.as_ref(),
            &Destinatario::Email("INSEGNANTE@scuola.it".into()),
        )
        .await
        .unwrap();
        assert_eq!(promosso.ruolo, Ruolo::Admin);

        let di_nuovo = promuovi_amministratore(archivio.utenti.as_ref(), &Destinatario::Id(u.id))
            .await
            .unwrap();
        assert_eq!(di_nuovo.ruolo, Ruolo::Admin);

        let ignoto =
            promuovi_amministratore(archivio.utenti.as_ref(), &Destinatario::Id("x".into())).await;
        assert!(matches!(ignoto, Err(AppError::NonTrovato(_))));
    }
}
