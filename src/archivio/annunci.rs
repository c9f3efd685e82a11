// src/archivio/annunci.rs
use super::{nuovo_id, ArchivioSqlite, Collezione};
use crate::{
    error::{AppError, AppResult},
    models::annuncio::{Annuncio, FiltroAnnunci, ModificaAnnuncio, NuovoAnnuncio},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

#[async_trait]
impl Collezione<Annuncio> for ArchivioSqlite {
    async fn elenca(&self, filtro: &FiltroAnnunci) -> AppResult<Vec<Annuncio>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM annunci");
        if filtro.solo_pubblicati {
            qb.push(" WHERE pubblicato = 1");
        }
        // Più recenti prima; un limite non positivo viene ignorato
        qb.push(" ORDER BY creato_il DESC");
        if let Some(limite) = filtro.limite.filter(|l| *l > 0) {
            qb.push(" LIMIT ").push_bind(limite);
        }

        let annunci = qb.build_query_as::<Annuncio>().fetch_all(&self.pool).await?;
        Ok(annunci)
    }

    async fn trova(&self, id: &str) -> AppResult<Option<Annuncio>> {
        self.trova_record::<Annuncio>(id).await
    }

    async fn crea(&self, nuovo: NuovoAnnuncio) -> AppResult<Annuncio> {
        nuovo.valida()?;
        let adesso = Utc::now();
        let annuncio = Annuncio {
            id: nuovo_id(),
            titolo: nuovo.titolo.trim().to_string(),
            contenuto: nuovo.contenuto,
            pubblicato: nuovo.pubblicato,
            autore_id: nuovo.autore_id,
            creato_il: adesso,
            aggiornato_il: adesso,
        };

        sqlx::query(
            r#"
            INSERT INTO annunci (id, titolo, contenuto, pubblicato, autore_id, creato_il, aggiornato_il)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&annuncio.id)
        .bind(&annuncio.titolo)
        .bind(&annuncio.contenuto)
        .bind(annuncio.pubblicato)
        .bind(&annuncio.autore_id)
        .bind(annuncio.creato_il)
        .bind(annuncio.aggiornato_il)
        .execute(&self.pool)
        .await?;

        tracing::info!("📢 Annuncio '{}' creato (pubblicato: {}).", annuncio.titolo, annuncio.pubblicato);
        Ok(annuncio)
    }

    async fn aggiorna(&self, id: &str, modifica: ModificaAnnuncio) -> AppResult<Annuncio> {
        let mut tx = self.pool.begin().await?;
        let mut annuncio = sqlx::query_as::<_, Annuncio>("SELECT * FROM annunci WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NonTrovato("Annuncio"))?;

        modifica.applica(&mut annuncio)?;
        annuncio.aggiornato_il = Utc::now();

        sqlx::query(
            "UPDATE annunci SET titolo = ?1, contenuto = ?2, pubblicato = ?3, aggiornato_il = ?4 WHERE id = ?5",
        )
        .bind(&annuncio.titolo)
        .bind(&annuncio.contenuto)
        .bind(annuncio.pubblicato)
        .bind(annuncio.aggiornato_il)
        .bind(&annuncio.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(annuncio)
    }

    async fn elimina(&self, id: &str) -> AppResult<()> {
        self.elimina_record::<Annuncio>(id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        archivio::{Archivio, Collezione},
        db::pool_in_memoria,
        models::annuncio::{FiltroAnnunci, ModificaAnnuncio, NuovoAnnuncio},
    };

    fn annuncio(titolo: &str, pubblicato: bool) -> NuovoAnnuncio {
        NuovoAnnuncio {
            titolo: titolo.into(),
            contenuto: "...".into(),
            pubblicato,
            autore_id: None,
        }
    }

    #[tokio::test]
    async fn solo_pubblicati_per_il_pubblico() {
        let archivio = Archivio::sqlite(pool_in_memoria().await.unwrap());
        let bozza = archivio.annunci.crea(annuncio("Bozza", false)).await.unwrap();
        archivio.annunci.crea(annuncio("Orari", true)).await.unwrap();

        let pubblici = archivio
            .annunci
            .elenca(&FiltroAnnunci {
                solo_pubblicati: true,
                limite: None,
            })
            .await
            .unwrap();
        assert_eq!(pubblici.len(), 1);
        assert_eq!(pubblici[0].titolo, "Orari");

        archivio
            .annunci
            .aggiorna(
                &bozza.id,
                ModificaAnnuncio {
                    pubblicato: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let tutti = archivio
            .annunci
            .elenca(&FiltroAnnunci {
                solo_pubblicati: true,
                limite: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(tutti.len(), 1);
    }
}
