// src/services/capacita.rs
use crate::{
    archivio::{Collezione, RepoUtenti},
    error::AppResult,
    models::utente::{FiltroUtenti, Ruolo, Utente},
};
use serde::{Deserialize, Serialize};

/// Chiave della sessione in cui viene salvata la capacità risolta al login.
pub const CHIAVE_SESSIONE: &str = "capacita";

/// Permessi dell'utente, calcolati una sola volta per sessione.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacita {
    pub utente_id: String,
    pub email: String,
    pub ruolo: Ruolo,
    pub amministratore: bool,
    /// Allievi di cui si possono vedere i pagamenti (sé stessi o i figli).
    /// Non usato per gli amministratori, che vedono tutto.
    pub allievi_visibili: Vec<String>,
}

impl Capacita {
    pub fn puo_vedere_allievo(&self, allievo_id: &str) -> bool {
        self.amministratore || self.allievi_visibili.iter().any(|id| id == allievo_id)
    }
}

/// Amministratore per ruolo nel profilo oppure per email nella lista di fallback.
pub fn e_amministratore(utente: &Utente, admin_emails: &[String]) -> bool {
    utente.ruolo == Ruolo::Admin
        || admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(utente.email.trim()))
}

pub async fn risolvi(
    utenti: &dyn RepoUtenti,
    utente: &Utente,
    admin_emails: &[String],
) -> AppResult<Capacita> {
    let amministratore = e_amministratore(utente, admin_emails);

    let allievi_visibili = match utente.ruolo {
        _ if amministratore => Vec::new(),
        Ruolo::Allievo => vec![utente.id.clone()],
        Ruolo::Genitore => {
            let filtro = FiltroUtenti {
                genitore_id: Some(utente.id.clone()),
                ..Default::default()
            };
            utenti
                .elenca(&filtro)
                .await?
                .into_iter()
                .map(|figlio| figlio.id)
                .collect()
        }
        Ruolo::Admin | Ruolo::Insegnante => Vec::new(),
    };

    tracing::debug!(
        "Capacità per {}: admin={}, allievi visibili={:?}",
        utente.id,
        amministratore,
        allievi_visibili
    );

    Ok(Capacita {
        utente_id: utente.id.clone(),
        email: utente.email.clone(),
        ruolo: utente.ruolo,
        amministratore,
        allievi_visibili,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archivio::{Archivio, Collezione},
        db::pool_in_memoria,
        models::utente::{tests::utente_di_prova, NuovoUtente},
    };

    fn nuovo(email: &str, ruolo: Ruolo, genitore_id: Option<String>) -> NuovoUtente {
        NuovoUtente {
            email: email.into(),
            password: None,
            nome: "N".into(),
            cognome: "C".into(),
            ruolo,
            genitore_id,
            data_iscrizione: None,
            corsi: vec![],
        }
    }

    #[test]
    fn amministratore_per_ruolo_o_per_email() {
        let mut u = utente_di_prova("x");
        assert!(!e_amministratore(&u, &[]));
        assert!(e_amministratore(&u, &["X@Scuola.it".to_string()]));
        u.ruolo = Ruolo::Admin;
        assert!(e_amministratore(&u, &[]));
    }

    #[tokio::test]
    async fn genitore_vede_solo_i_propri_figli() {
        let archivio = Archivio::sqlite(pool_in_memoria().await.unwrap());
        let genitore = archivio
            .utenti
            .crea(nuovo("papa@scuola.it", Ruolo::Genitore, None))
            .await
            .unwrap();
        let figlio = archivio
            .utenti
            .crea(nuovo("figlio@scuola.it", Ruolo::Allievo, Some(genitore.id.clone())))
            .await
            .unwrap();
        let estraneo = archivio
            .utenti
            .crea(nuovo("altro@scuola.it", Ruolo::Allievo, None))
            .await
            .unwrap();

        let cap = risolvi(archivio.utenti.as_ref(), &genitore, &[]).await.unwrap();
        assert!(!cap.amministratore);
        assert!(cap.puo_vedere_allievo(&figlio.id));
        assert!(!cap.puo_vedere_allievo(&estraneo.id));

        let cap_allievo = risolvi(archivio.utenti.as_ref(), &estraneo, &[]).await.unwrap();
        assert_eq!(cap_allievo.allievi_visibili, vec![estraneo.id.clone()]);
        assert!(!cap_allievo.puo_vedere_allievo(&figlio.id));

        let cap_admin = risolvi(
            archivio.utenti.as_ref(),
            &estraneo,
            &["altro@scuola.it".to_string()],
        )
        .await
        .unwrap();
        assert!(cap_admin.puo_vedere_allievo(&figlio.id));
    }
}
