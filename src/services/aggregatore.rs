// src/services/aggregatore.rs
use crate::{
    error::AppResult,
    models::{
        corso::Corso,
        pagamento::{valida_anno, Categoria, Mese, Pagamento},
        utente::Utente,
    },
    services::stato_pagamento::{trova_mensilita, RegolaScadenza, StatoMensile},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Filtri del report amministrativo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltriReport {
    /// Anno accademico (anno di settembre).
    pub anno: Option<i32>,
    pub mese: Option<Mese>,
    pub corso: Option<String>,
    pub ricerca: Option<String>,
    pub categoria: Option<Categoria>,
}

impl FiltriReport {
    pub fn valida(&self) -> AppResult<()> {
        if let Some(anno) = self.anno {
            valida_anno(anno)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TotaliMese {
    pub pagato: f64,
    pub non_pagato: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Riepilogo {
    pub totale_pagato: f64,
    /// Quote mensili non incassate, scadute comprese.
    pub totale_non_incassato: f64,
    /// Sottoinsieme di `totale_non_incassato` oltre la scadenza.
    pub totale_scaduto: f64,
    pub numero_pagamenti: usize,
    pub per_mese: BTreeMap<Mese, TotaliMese>,
}

/// Filtro annuo "largo": l'anno accademico Y copre i record con anno Y e Y+1.
/// I record privi di anno vengono inclusi.
pub fn anno_compatibile(anno_record: Option<i32>, anno_accademico: i32) -> bool {
    match anno_record {
        None => true,
        Some(anno) => anno == anno_accademico || anno == anno_accademico.saturating_add(1),
    }
}

/// Aggrega i pagamenti applicando i filtri del report.
///
/// `allievi` serve per i filtri per corso e per ricerca testuale: i pagamenti di
/// allievi sconosciuti vengono esclusi quando uno di questi filtri è attivo.
pub fn aggrega(
    pagamenti: &[Pagamento],
    allievi: &HashMap<String, Utente>,
    filtri: &FiltriReport,
    anno_riferimento: i32,
    regola: &RegolaScadenza,
    oggi: NaiveDate,
) -> Riepilogo {
    let anno_accademico = filtri.anno.unwrap_or(anno_riferimento);
    let ricerca = filtri
        .ricerca
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let mut riepilogo = Riepilogo::default();

    for p in pagamenti {
        if filtri.anno.is_some() && !anno_compatibile(p.anno, anno_accademico) {
            continue;
        }
        if let Some(mese) = filtri.mese {
            if p.mese != Some(mese) {
                continue;
            }
        }
        if let Some(categoria) = filtri.categoria {
            if p.categoria != categoria {
                continue;
            }
        }
        if filtri.corso.is_some() || ricerca.is_some() {
            let Some(allievo) = allievi.get(&p.utente_id) else {
                continue;
            };
            if let Some(corso) = &filtri.corso {
                if !allievo.frequenta(corso) {
                    continue;
                }
            }
            if let Some(termine) = ricerca {
                if !allievo.corrisponde_ricerca(termine) {
                    continue;
                }
            }
        }

        riepilogo.numero_pagamenti += 1;

        if p.pagato() {
            riepilogo.totale_pagato += p.importo;
            if let Some(mese) = p.mese {
                riepilogo.per_mese.entry(mese).or_default().pagato += p.importo;
            }
            continue;
        }

        // Solo le quote mensili contano come "da incassare"
        if !p.mensile() {
            continue;
        }
        riepilogo.totale_non_incassato += p.importo;
        if let Some(mese) = p.mese {
            riepilogo.per_mese.entry(mese).or_default().non_pagato += p.importo;
        }
        if regola.risolvi_record(p, anno_accademico, oggi) == Some(StatoMensile::Scaduto) {
            riepilogo.totale_scaduto += p.importo;
        }
    }

    riepilogo
}

/// Quota di un corso dell'allievo, con il nome preso dal catalogo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaCorso {
    pub corso_id: String,
    pub nome: String,
    pub prezzo: f64,
}

/// Unisce gli slot `corso_N`/`prezzo_corsoN` al catalogo.
/// Un id assente dal catalogo viene ignorato in silenzio.
pub fn quote_corsi(allievo: &Utente, catalogo: &[Corso]) -> Vec<QuotaCorso> {
    allievo
        .corsi_assegnati()
        .into_iter()
        .filter_map(|assegnato| {
            let corso = catalogo.iter().find(|c| c.id == assegnato.corso_id)?;
            Some(QuotaCorso {
                corso_id: assegnato.corso_id,
                nome: corso.nome.clone(),
                prezzo: assegnato.prezzo,
            })
        })
        .collect()
}

pub fn quota_mensile(allievo: &Utente, catalogo: &[Corso]) -> f64 {
    quote_corsi(allievo, catalogo).iter().map(|q| q.prezzo).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigaMese {
    pub mese: Mese,
    pub anno: i32,
    pub stato: StatoMensile,
    pub importo: Option<f64>,
    pub pagamento_id: Option<String>,
}

/// Prospetto annuale di un allievo (settembre … agosto).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspettoAnnuale {
    pub utente_id: String,
    pub anno_accademico: i32,
    pub corsi: Vec<QuotaCorso>,
    pub quota_mensile: f64,
    pub mesi: Vec<RigaMese>,
    pub totale_pagato: f64,
    pub totale_non_incassato: f64,
    pub totale_scaduto: f64,
}

pub fn prospetto_annuale(
    allievo: &Utente,
    pagamenti: &[Pagamento],
    catalogo: &[Corso],
    anno_accademico: i32,
    regola: &RegolaScadenza,
    oggi: NaiveDate,
) -> ProspettoAnnuale {
    let propri: Vec<Pagamento> = pagamenti
        .iter()
        .filter(|p| p.utente_id == allievo.id)
        .cloned()
        .collect();

    let corsi = quote_corsi(allievo, catalogo);
    let quota_mensile = corsi.iter().map(|q| q.prezzo).sum();

    let mut prospetto = ProspettoAnnuale {
        utente_id: allievo.id.clone(),
        anno_accademico,
        corsi,
        quota_mensile,
        mesi: Vec::with_capacity(12),
        totale_pagato: 0.0,
        totale_non_incassato: 0.0,
        totale_scaduto: 0.0,
    };

    for mese in Mese::ANNO_ACCADEMICO {
        let record = trova_mensilita(&propri, mese, anno_accademico);
        let stato = regola.risolvi(record, mese, anno_accademico, oggi);
        let importo = record.map(|p| p.importo);

        match stato {
            StatoMensile::Pagato => prospetto.totale_pagato += importo.unwrap_or(0.0),
            StatoMensile::NonPagato => prospetto.totale_non_incassato += importo.unwrap_or(0.0),
            StatoMensile::Scaduto => {
                prospetto.totale_non_incassato += importo.unwrap_or(0.0);
                prospetto.totale_scaduto += importo.unwrap_or(0.0);
            }
            StatoMensile::NonDovuto => {}
        }

        prospetto.mesi.push(RigaMese {
            mese,
            anno: mese.anno_solare(anno_accademico),
            stato,
            importo,
            pagamento_id: record.map(|p| p.id.clone()),
        });
    }

    prospetto
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{pagamento::StatoPagamento, utente::tests::utente_di_prova};
    use crate::services::stato_pagamento::tests::mensile;
    use chrono::Utc;

    fn data(a: i32, m: u32, g: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(a, m, g).unwrap()
    }

    fn corso(id: &str, nome: &str) -> Corso {
        let adesso = Utc::now();
        Corso {
            id: id.into(),
            nome: nome.into(),
            descrizione: None,
            creato_il: adesso,
            aggiornato_il: adesso,
        }
    }

    fn allievi(lista: Vec<Utente>) -> HashMap<String, Utente> {
        lista.into_iter().map(|u| (u.id.clone(), u)).collect()
    }

    #[test]
    fn gennaio_pagato_febbraio_scaduto() {
        let pagamenti = vec![
            mensile("a1", Mese::Gennaio, Some(2025), StatoPagamento::Pagato, 50.0),
            mensile("a1", Mese::Febbraio, Some(2025), StatoPagamento::NonPagato, 50.0),
        ];
        let filtri = FiltriReport {
            anno: Some(2024),
            ..Default::default()
        };
        let r = aggrega(
            &pagamenti,
            &HashMap::new(),
            &filtri,
            2024,
            &RegolaScadenza::default(),
            data(2025, 2, 15),
        );
        assert_eq!(r.totale_pagato, 50.0);
        assert_eq!(r.totale_non_incassato, 50.0);
        assert_eq!(r.totale_scaduto, 50.0);
        assert_eq!(r.per_mese[&Mese::Gennaio].pagato, 50.0);
        assert_eq!(r.per_mese[&Mese::Febbraio].non_pagato, 50.0);
    }

    #[test]
    fn filtro_anno_largo() {
        let pagamenti = vec![
            mensile("a1", Mese::Ottobre, Some(2024), StatoPagamento::Pagato, 40.0),
            mensile("a1", Mese::Marzo, Some(2025), StatoPagamento::Pagato, 40.0),
            mensile("a1", Mese::Maggio, None, StatoPagamento::Pagato, 40.0),
            mensile("a1", Mese::Ottobre, Some(2023), StatoPagamento::Pagato, 40.0),
        ];
        let filtri = FiltriReport {
            anno: Some(2024),
            ..Default::default()
        };
        let r = aggrega(
            &pagamenti,
            &HashMap::new(),
            &filtri,
            2024,
            &RegolaScadenza::default(),
            data(2025, 6, 1),
        );
        assert_eq!(r.numero_pagamenti, 3);
        assert_eq!(r.totale_pagato, 120.0);
    }

    #[test]
    fn mensilita_senza_anno_scaduta_nell_anno_visualizzato() {
        let pagamenti = vec![mensile("a1", Mese::Febbraio, None, StatoPagamento::NonPagato, 50.0)];
        let filtri = FiltriReport {
            anno: Some(2024),
            ..Default::default()
        };
        let regola = RegolaScadenza::default();

        // Febbraio dell'anno accademico 2024 cade nel 2025: il 15 è oltre la scadenza
        let dopo = aggrega(&pagamenti, &HashMap::new(), &filtri, 2024, &regola, data(2025, 2, 15));
        assert_eq!(dopo.totale_non_incassato, 50.0);
        assert_eq!(dopo.totale_scaduto, 50.0);

        let prima = aggrega(&pagamenti, &HashMap::new(), &filtri, 2024, &regola, data(2025, 2, 8));
        assert_eq!(prima.totale_non_incassato, 50.0);
        assert_eq!(prima.totale_scaduto, 0.0);

        // Senza filtro vale l'anno di riferimento
        let riferimento =
            aggrega(&pagamenti, &HashMap::new(), &FiltriReport::default(), 2024, &regola, data(2025, 2, 11));
        assert_eq!(riferimento.totale_scaduto, 50.0);
    }

    #[test]
    fn anno_estremo_non_va_in_overflow() {
        let filtri = FiltriReport {
            anno: Some(i32::MAX),
            ..Default::default()
        };
        assert!(filtri.valida().is_err());
        assert!(FiltriReport::default().valida().is_ok());

        let pagamenti = vec![mensile("a1", Mese::Marzo, None, StatoPagamento::NonPagato, 50.0)];
        let regola = RegolaScadenza::default();
        let r = aggrega(&pagamenti, &HashMap::new(), &filtri, 2024, &regola, data(2025, 6, 1));
        assert_eq!(r.numero_pagamenti, 1);
        assert_eq!(r.totale_scaduto, 0.0);

        let p = prospetto_annuale(
            &utente_di_prova("a1"),
            &pagamenti,
            &[],
            i32::MAX,
            &regola,
            data(2025, 6, 1),
        );
        assert_eq!(p.mesi.len(), 12);
    }

    #[test]
    fn non_mensili_non_entrano_nel_non_incassato() {
        let mut saggio = mensile("a1", Mese::Giugno, Some(2025), StatoPagamento::NonPagato, 30.0);
        saggio.categoria = Categoria::Saggio;
        let r = aggrega(
            &[saggio],
            &HashMap::new(),
            &FiltriReport::default(),
            2024,
            &RegolaScadenza::default(),
            data(2025, 7, 1),
        );
        assert_eq!(r.totale_non_incassato, 0.0);
        assert_eq!(r.numero_pagamenti, 1);
    }

    #[test]
    fn filtri_per_corso_e_ricerca() {
        let mut giulia = utente_di_prova("a1");
        giulia.corso_1 = Some("classica".into());
        let mut marco = utente_di_prova("a2");
        marco.nome = "Marco".into();
        marco.cognome = "Bianchi".into();
        marco.corso_1 = Some("hiphop".into());

        let pagamenti = vec![
            mensile("a1", Mese::Ottobre, Some(2024), StatoPagamento::Pagato, 40.0),
            mensile("a2", Mese::Ottobre, Some(2024), StatoPagamento::NonPagato, 35.0),
            mensile("ignoto", Mese::Ottobre, Some(2024), StatoPagamento::Pagato, 99.0),
        ];
        let anagrafica = allievi(vec![giulia, marco]);
        let regola = RegolaScadenza::default();
        let oggi = data(2024, 10, 5);

        let per_corso = aggrega(
            &pagamenti,
            &anagrafica,
            &FiltriReport {
                corso: Some("hiphop".into()),
                ..Default::default()
            },
            2024,
            &regola,
            oggi,
        );
        assert_eq!(per_corso.numero_pagamenti, 1);
        assert_eq!(per_corso.totale_non_incassato, 35.0);
        assert_eq!(per_corso.totale_scaduto, 0.0);

        let per_nome = aggrega(
            &pagamenti,
            &anagrafica,
            &FiltriReport {
                ricerca: Some("ROSSI".into()),
                ..Default::default()
            },
            2024,
            &regola,
            oggi,
        );
        assert_eq!(per_nome.numero_pagamenti, 1);
        assert_eq!(per_nome.totale_pagato, 40.0);

        let per_mese = aggrega(
            &pagamenti,
            &anagrafica,
            &FiltriReport {
                mese: Some(Mese::Novembre),
                ..Default::default()
            },
            2024,
            &regola,
            oggi,
        );
        assert_eq!(per_mese.numero_pagamenti, 0);
    }

    #[test]
    fn corsi_assenti_dal_catalogo_esclusi() {
        let mut u = utente_di_prova("a1");
        u.corso_1 = Some("classica".into());
        u.prezzo_corso1 = Some(45.0);
        u.corso_2 = Some("cancellato".into());
        u.prezzo_corso2 = Some(30.0);
        let catalogo = vec![corso("classica", "Danza classica")];

        let quote = quote_corsi(&u, &catalogo);
        assert_eq!(quote.len(), 1);
        assert_eq!(quote[0].nome, "Danza classica");
        assert_eq!(quota_mensile(&u, &catalogo), 45.0);
    }

    #[test]
    fn prospetto_annuale_copre_dodici_mesi() {
        let mut u = utente_di_prova("a1");
        u.corso_1 = Some("classica".into());
        u.prezzo_corso1 = Some(50.0);
        let pagamenti = vec![
            mensile("a1", Mese::Gennaio, Some(2025), StatoPagamento::Pagato, 50.0),
            mensile("a1", Mese::Febbraio, Some(2025), StatoPagamento::NonPagato, 50.0),
            mensile("a1", Mese::Marzo, Some(2025), StatoPagamento::NonPagato, 50.0),
            mensile("altro", Mese::Gennaio, Some(2025), StatoPagamento::Pagato, 70.0),
        ];
        let p = prospetto_annuale(
            &u,
            &pagamenti,
            &[corso("classica", "Danza classica")],
            2024,
            &RegolaScadenza::default(),
            data(2025, 2, 15),
        );

        assert_eq!(p.mesi.len(), 12);
        assert_eq!(p.mesi[0].mese, Mese::Settembre);
        assert_eq!(p.mesi[0].stato, StatoMensile::NonDovuto);
        assert_eq!(p.mesi[4].stato, StatoMensile::Pagato);
        assert_eq!(p.mesi[5].stato, StatoMensile::Scaduto);
        assert_eq!(p.mesi[6].stato, StatoMensile::NonPagato);
        assert_eq!(p.mesi[5].anno, 2025);
        assert_eq!(p.quota_mensile, 50.0);
        assert_eq!(p.totale_pagato, 50.0);
        assert_eq!(p.totale_non_incassato, 100.0);
        assert_eq!(p.totale_scaduto, 50.0);
    }
}
