// src/archivio/corsi.rs
use super::{nuovo_id, pattern_ricerca, ArchivioSqlite, Collezione};
use crate::{
    error::{AppError, AppResult},
    models::corso::{Corso, FiltroCorsi, ModificaCorso, NuovoCorso},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

#[async_trait]
impl Collezione<Corso> for ArchivioSqlite {
    async fn elenca(&self, filtro: &FiltroCorsi) -> AppResult<Vec<Corso>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM corsi");
        if let Some(ricerca) = filtro.ricerca.as_deref().filter(|r| !r.trim().is_empty()) {
            qb.push(" WHERE lower(nome) LIKE ").push_bind(pattern_ricerca(ricerca));
        }
        qb.push(" ORDER BY nome ASC");

        let corsi = qb.build_query_as::<Corso>().fetch_all(&self.pool).await?;
        Ok(corsi)
    }

    async fn trova(&self, id: &str) -> AppResult<Option<Corso>> {
        self.trova_record::<Corso>(id).await
    }

    async fn crea(&self, nuovo: NuovoCorso) -> AppResult<Corso> {
        nuovo.valida()?;
        let adesso = Utc::now();
        let corso = Corso {
            id: nuovo_id(),
            nome: nuovo.nome.trim().to_string(),
            descrizione: nuovo.descrizione,
            creato_il: adesso,
            aggiornato_il: adesso,
        };

        sqlx::query(
            "INSERT INTO corsi (id, nome, descrizione, creato_il, aggiornato_il) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&corso.id)
        .bind(&corso.nome)
        .bind(&corso.descrizione)
        .bind(corso.creato_il)
        .bind(corso.aggiornato_il)
        .execute(&self.pool)
        .await?;

        tracing::info!("✅ Corso '{}' creato ({}).", corso.nome, corso.id);
        Ok(corso)
    }

    async fn aggiorna(&self, id: &str, modifica: ModificaCorso) -> AppResult<Corso> {
        let mut tx = self.pool.begin().await?;
        let mut corso = sqlx::query_as::<_, Corso>("SELECT * FROM corsi WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NonTrovato("Corso"))?;

        modifica.applica(&mut corso)?;
        corso.aggiornato_il = Utc::now();

        sqlx::query("UPDATE corsi SET nome = ?1, descrizione = ?2, aggiornato_il = ?3 WHERE id = ?4")
            .bind(&corso.nome)
            .bind(&corso.descrizione)
            .bind(corso.aggiornato_il)
            .bind(&corso.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Corso '{}' aggiornato.", id);
        Ok(corso)
    }

    async fn elimina(&self, id: &str) -> AppResult<()> {
        // Gli slot corso_N degli allievi non vengono toccati: un id orfano
        // viene ignorato nel calcolo delle quote.
        self.elimina_record::<Corso>(id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        archivio::{Archivio, Collezione},
        db::pool_in_memoria,
        models::corso::{FiltroCorsi, ModificaCorso, NuovoCorso},
    };

    #[tokio::test]
    async fn catalogo_ordinato_e_filtrabile() {
        let archivio = Archivio::sqlite(pool_in_memoria().await.unwrap());
        for nome in ["Hip Hop", "Classica", "Moderna"] {
            archivio
                .corsi
                .crea(NuovoCorso {
                    nome: nome.into(),
                    descrizione: None,
                })
                .await
                .unwrap();
        }

        let tutti = archivio.corsi.elenca(&FiltroCorsi::default()).await.unwrap();
        let nomi: Vec<_> = tutti.iter().map(|c| c.nome.as_str()).collect();
        assert_eq!(nomi, vec!["Classica", "Hip Hop", "Moderna"]);

        let filtrati = archivio
            .corsi
            .elenca(&FiltroCorsi {
                ricerca: Some("HIP".into()),
            })
            .await
            .unwrap();
        assert_eq!(filtrati.len(), 1);

        let rinominato = archivio
            .corsi
            .aggiorna(
                &tutti[0].id,
                ModificaCorso {
                    nome: Some("Danza classica".into()),
                    descrizione: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(rinominato.nome, "Danza classica");
    }
}
