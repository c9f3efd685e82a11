// src/archivio/pagamenti.rs
use super::{mappa_conflitto, nuovo_id, ArchivioSqlite, Collezione, RepoPagamenti};
use crate::{
    error::{AppError, AppResult},
    models::pagamento::{FiltroPagamenti, Mensilita, ModificaPagamento, NuovoPagamento, Pagamento},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

const PAGAMENTO_DUPLICATO: &str =
    "Esiste già un pagamento per questo allievo, mese, anno e categoria.";

#[async_trait]
impl Collezione<Pagamento> for ArchivioSqlite {
    async fn elenca(&self, filtro: &FiltroPagamenti) -> AppResult<Vec<Pagamento>> {
        filtro.valida()?;

        // --- Condizioni facoltative, una per campo del filtro ---
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM pagamenti WHERE 1 = 1");

        if let Some(utente_id) = &filtro.utente_id {
            qb.push(" AND utente_id = ").push_bind(utente_id.clone());
        }
        if let Some(anno) = filtro.anno {
            // L'anno accademico Y copre due anni solari; i record senza anno restano inclusi
            qb.push(" AND (anno IS NULL OR anno IN (")
                .push_bind(anno)
                .push(", ")
                .push_bind(anno.saturating_add(1))
                .push("))");
        }
        if let Some(mese) = filtro.mese {
            qb.push(" AND mese = ").push_bind(mese);
        }
        if let Some(categoria) = filtro.categoria {
            qb.push(" AND categoria = ").push_bind(categoria);
        }
        if let Some(stato) = filtro.stato {
            qb.push(" AND stato = ").push_bind(stato);
        }
        qb.push(" ORDER BY anno ASC, creato_il ASC");

        let pagamenti = qb.build_query_as::<Pagamento>().fetch_all(&self.pool).await?;
        tracing::debug!("Trovati {} pagamenti.", pagamenti.len());
        Ok(pagamenti)
    }

    async fn trova(&self, id: &str) -> AppResult<Option<Pagamento>> {
        self.trova_record::<Pagamento>(id).await
    }

    async fn crea(&self, nuovo: NuovoPagamento) -> AppResult<Pagamento> {
        nuovo.valida()?;

        // --- Costruzione del record con timestamp lato server ---
        let adesso = Utc::now();
        let pagamento = Pagamento {
            id: nuovo_id(),
            utente_id: nuovo.utente_id,
            categoria: nuovo.categoria,
            mese: nuovo.mese,
            anno: nuovo.anno,
            stato: nuovo.stato,
            importo: nuovo.importo,
            note: nuovo.note,
            data_pagamento: nuovo.data_pagamento,
            creato_il: adesso,
            aggiornato_il: adesso,
        };

        // Il vincolo UNIQUE diventa un Conflitto, la chiave esterna un DatiNonValidi
        sqlx::query(
            r#"
            INSERT INTO pagamenti
                (id, utente_id, categoria, mese, anno, stato, importo, note, data_pagamento, creato_il, aggiornato_il)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&pagamento.id)
        .bind(&pagamento.utente_id)
        .bind(pagamento.categoria)
        .bind(pagamento.mese)
        .bind(pagamento.anno)
        .bind(pagamento.stato)
        .bind(pagamento.importo)
        .bind(&pagamento.note)
        .bind(pagamento.data_pagamento)
        .bind(pagamento.creato_il)
        .bind(pagamento.aggiornato_il)
        .execute(&self.pool)
        .await
        .map_err(|e| mappa_conflitto(e, PAGAMENTO_DUPLICATO))?;

        tracing::info!(
            "💶 Pagamento {} creato per allievo {} ({:?}).",
            pagamento.id,
            pagamento.utente_id,
            pagamento.categoria
        );
        Ok(pagamento)
    }

    async fn aggiorna(&self, id: &str, modifica: ModificaPagamento) -> AppResult<Pagamento> {
        let mut tx = self.pool.begin().await?;
        let mut pagamento = sqlx::query_as::<_, Pagamento>("SELECT * FROM pagamenti WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NonTrovato("Pagamento"))?;

        // applica() ricontrolla mese e anno per le mensilità
        modifica.applica(&mut pagamento)?;
        pagamento.aggiornato_il = Utc::now();

        sqlx::query(
            r#"
            UPDATE pagamenti SET
                categoria = ?1, mese = ?2, anno = ?3, stato = ?4, importo = ?5,
                note = ?6, data_pagamento = ?7, aggiornato_il = ?8
            WHERE id = ?9
            "#,
        )
        .bind(pagamento.categoria)
        .bind(pagamento.mese)
        .bind(pagamento.anno)
        .bind(pagamento.stato)
        .bind(pagamento.importo)
        .bind(&pagamento.note)
        .bind(pagamento.data_pagamento)
        .bind(pagamento.aggiornato_il)
        .bind(&pagamento.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| mappa_conflitto(e, PAGAMENTO_DUPLICATO))?;
        tx.commit().await?;

        tracing::info!("✅ Pagamento {} aggiornato ({:?}).", id, pagamento.stato);
        Ok(pagamento)
    }

    async fn elimina(&self, id: &str) -> AppResult<()> {
        self.elimina_record::<Pagamento>(id).await
    }
}

#[async_trait]
impl RepoPagamenti for ArchivioSqlite {
    async fn registra_mensilita(&self, m: Mensilita) -> AppResult<Pagamento> {
        m.valida()?;
        tracing::debug!(
            "Upsert quota {:?} {} {} per allievo {}: {:?}",
            m.categoria,
            m.mese,
            m.anno,
            m.utente_id,
            m.stato
        );

        let adesso = Utc::now();
        // Una sola istruzione: niente finestra tra lettura e scrittura
        let pagamento = sqlx::query_as::<_, Pagamento>(
            r#"
            INSERT INTO pagamenti
                (id, utente_id, categoria, mese, anno, stato, importo, data_pagamento, creato_il, aggiornato_il)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT (utente_id, categoria, mese, anno) DO UPDATE SET
                stato = excluded.stato,
                importo = excluded.importo,
                data_pagamento = excluded.data_pagamento,
                aggiornato_il = excluded.aggiornato_il
            RETURNING *
            "#,
        )
        .bind(nuovo_id())
        .bind(&m.utente_id)
        .bind(m.categoria)
        .bind(m.mese)
        .bind(m.anno)
        .bind(m.stato)
        .bind(m.importo)
        .bind(m.data_pagamento)
        .bind(adesso)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| mappa_conflitto(e, PAGAMENTO_DUPLICATO))?;

        tracing::info!(
            "💶 Quota {} {} dell'allievo {} registrata come {:?}.",
            pagamento.mese.map(|m| m.nome()).unwrap_or("-"),
            m.anno,
            pagamento.utente_id,
            pagamento.stato
        );
        Ok(pagamento)
    }
}
