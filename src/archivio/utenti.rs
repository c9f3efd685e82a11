// src/archivio/utenti.rs
use super::{mappa_conflitto, nuovo_id, pattern_ricerca, ArchivioSqlite, Collezione, RepoUtenti};
use crate::{
    error::{AppError, AppResult},
    models::utente::{FiltroUtenti, ModificaUtente, NuovoUtente, Utente},
    services::auth_service,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const EMAIL_DUPLICATA: &str = "Esiste già un utente con questa email.";

// Scrive tutte le colonne di un utente già esistente
async fn salva_utente(conn: &mut SqliteConnection, u: &Utente) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE utenti SET
            email = ?1, password_hash = ?2, nome = ?3, cognome = ?4, ruolo = ?5,
            genitore_id = ?6, data_iscrizione = ?7,
            corso_1 = ?8, prezzo_corso1 = ?9, corso_2 = ?10, prezzo_corso2 = ?11,
            corso_3 = ?12, prezzo_corso3 = ?13, corso_4 = ?14, prezzo_corso4 = ?15,
            corso_5 = ?16, prezzo_corso5 = ?17,
            aggiornato_il = ?18
        WHERE id = ?19
        "#,
    )
    .bind(&u.email)
    .bind(&u.password_hash)
    .bind(&u.nome)
    .bind(&u.cognome)
    .bind(u.ruolo)
    .bind(&u.genitore_id)
    .bind(u.data_iscrizione)
    .bind(&u.corso_1)
    .bind(u.prezzo_corso1)
    .bind(&u.corso_2)
    .bind(u.prezzo_corso2)
    .bind(&u.corso_3)
    .bind(u.prezzo_corso3)
    .bind(&u.corso_4)
    .bind(u.prezzo_corso4)
    .bind(&u.corso_5)
    .bind(u.prezzo_corso5)
    .bind(u.aggiornato_il)
    .bind(&u.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| mappa_conflitto(e, EMAIL_DUPLICATA))?;
    Ok(())
}

#[async_trait]
impl Collezione<Utente> for ArchivioSqlite {
    async fn elenca(&self, filtro: &FiltroUtenti) -> AppResult<Vec<Utente>> {
        // --- Costruzione della query con i soli filtri presenti ---
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM utenti WHERE 1 = 1");

        if let Some(ruolo) = filtro.ruolo {
            qb.push(" AND ruolo = ").push_bind(ruolo);
        }
        if let Some(genitore_id) = &filtro.genitore_id {
            qb.push(" AND genitore_id = ").push_bind(genitore_id.clone());
        }
        // Il corso può stare in uno qualsiasi dei cinque slot
        if let Some(corso_id) = &filtro.corso_id {
            qb.push(" AND ").push_bind(corso_id.clone());
            qb.push(" IN (corso_1, corso_2, corso_3, corso_4, corso_5)");
        }
        if let Some(ricerca) = filtro.ricerca.as_deref().filter(|r| !r.trim().is_empty()) {
            let pattern = pattern_ricerca(ricerca);
            qb.push(" AND (lower(nome) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(cognome) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(email) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY cognome ASC, nome ASC");

        let utenti = qb.build_query_as::<Utente>().fetch_all(&self.pool).await?;
        tracing::debug!("Trovati {} utenti.", utenti.len());
        Ok(utenti)
    }

    async fn trova(&self, id: &str) -> AppResult<Option<Utente>> {
        self.trova_record::<Utente>(id).await
    }

    async fn crea(&self, nuovo: NuovoUtente) -> AppResult<Utente> {
        nuovo.valida()?;
        tracing::info!("Creazione utente: {}", nuovo.email);

        // --- Hash della password (se fornita) fuori dalla transazione ---
        let password_hash = match &nuovo.password {
            Some(password) => Some(auth_service::hash_password(password).await?),
            None => None,
        };

        let adesso = Utc::now();
        let mut utente = Utente {
            id: nuovo_id(),
            email: nuovo.email.trim().to_string(),
            password_hash,
            nome: nuovo.nome,
            cognome: nuovo.cognome,
            ruolo: nuovo.ruolo,
            genitore_id: nuovo.genitore_id.filter(|g| !g.trim().is_empty()),
            data_iscrizione: nuovo.data_iscrizione,
            corso_1: None,
            prezzo_corso1: None,
            corso_2: None,
            prezzo_corso2: None,
            corso_3: None,
            prezzo_corso3: None,
            corso_4: None,
            prezzo_corso4: None,
            corso_5: None,
            prezzo_corso5: None,
            creato_il: adesso,
            aggiornato_il: adesso,
        };
        utente.imposta_corsi(&nuovo.corsi)?;

        // --- Inserimento: riga minima, poi tutte le colonne con salva_utente ---
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO utenti (id, email, nome, creato_il, aggiornato_il) VALUES (?1, ?2, ?3, ?4, ?4)")
            .bind(&utente.id)
            .bind(&utente.email)
            .bind(&utente.nome)
            .bind(adesso)
            .execute(&mut *tx)
            .await
            .map_err(|e| mappa_conflitto(e, EMAIL_DUPLICATA))?;
        salva_utente(&mut tx, &utente).await?;
        tx.commit().await?;

        tracing::info!("✅ Utente '{}' creato ({}).", utente.email, utente.id);
        Ok(utente)
    }

    async fn aggiorna(&self, id: &str, modifica: ModificaUtente) -> AppResult<Utente> {
        tracing::info!("Aggiornamento utente: {}", id);

        let nuova_password = modifica.password.clone();
        let mut tx = self.pool.begin().await?;

        // Lettura, fusione delle modifiche e scrittura nella stessa transazione
        let mut utente = sqlx::query_as::<_, Utente>("SELECT * FROM utenti WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NonTrovato("Utente"))?;

        modifica.applica(&mut utente)?;
        if utente.genitore_id.as_deref() == Some(id) {
            return Err(AppError::DatiNonValidi(
                "Un utente non può essere genitore di sé stesso.".to_string(),
            ));
        }
        if let Some(password) = nuova_password {
            utente.password_hash = Some(auth_service::hash_password(&password).await?);
        }
        utente.aggiornato_il = Utc::now();

        salva_utente(&mut tx, &utente).await?;
        tx.commit().await?;

        tracing::info!("✅ Utente '{}' aggiornato.", id);
        Ok(utente)
    }

    async fn elimina(&self, id: &str) -> AppResult<()> {
        self.elimina_record::<Utente>(id).await
    }
}

#[async_trait]
impl RepoUtenti for ArchivioSqlite {
    async fn trova_per_email(&self, email: &str) -> AppResult<Option<Utente>> {
        tracing::debug!("Ricerca utente per email: {}", email);
        // La colonna email è COLLATE NOCASE
        let utente = sqlx::query_as::<_, Utente>("SELECT * FROM utenti WHERE email = ?1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(utente)
    }
}
