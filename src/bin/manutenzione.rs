//! Strumento di manutenzione del portale: svuotamento delle collezioni e promozione ad admin.

use clap::{Args, Parser, Subcommand};
use portale_danza::{
    archivio::Archivio,
    config::Config,
    db,
    services::manutenzione::{self, CollezioneSvuotabile, Destinatario},
};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "manutenzione", version, about = "Manutenzione del portale della scuola di danza")]
struct Cli {
    #[command(subcommand)]
    comando: Comando,
}

#[derive(Debug, Subcommand)]
enum Comando {
    /// Elimina tutti i record delle collezioni indicate, a blocchi.
    Svuota {
        #[arg(value_enum, required = true, value_name = "COLLEZIONE")]
        collezioni: Vec<CollezioneSvuotabile>,

        /// Record eliminati per ogni istruzione.
        #[arg(long, default_value_t = 500)]
        batch: u32,

        /// Salta la conferma interattiva.
        #[arg(long)]
        si: bool,
    },
    /// Assegna il ruolo di amministratore a un account.
    Promuovi(Bersaglio),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Bersaglio {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    id: Option<String>,
}

impl Bersaglio {
    fn destinatario(self) -> anyhow::Result<Destinatario> {
        match (self.email, self.id) {
            (Some(email), _) => Ok(Destinatario::Email(email)),
            (None, Some(id)) => Ok(Destinatario::Id(id)),
            (None, None) => Err(anyhow::anyhow!("Indicare --email oppure --id")),
        }
    }
}

fn conferma(domanda: &str) -> anyhow::Result<bool> {
    print!("{domanda} [s/N] ");
    io::stdout().flush()?;
    let mut risposta = String::new();
    io::stdin().lock().read_line(&mut risposta)?;
    Ok(matches!(risposta.trim().to_lowercase().as_str(), "s" | "si" | "sì" | "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "portale_danza=info,sqlx=warn".into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::create_db_pool(&config.database_url).await?;

    match cli.comando {
        Comando::Svuota { collezioni, batch, si } => {
            for collezione in collezioni {
                let totale = manutenzione::conta(&pool, collezione).await?;
                if totale == 0 {
                    println!("{}: già vuota.", collezione.tabella());
                    continue;
                }
                let domanda = format!(
                    "Eliminare {} record da '{}'?",
                    totale,
                    collezione.tabella()
                );
                if !si && !conferma(&domanda)? {
                    println!("{}: saltata.", collezione.tabella());
                    continue;
                }
                let eliminati = manutenzione::svuota_a_blocchi(&pool, collezione, batch).await?;
                println!("{}: eliminati {} record.", collezione.tabella(), eliminati);
            }
        }
        Comando::Promuovi(bersaglio) => {
            let archivio = Archivio::sqlite(pool);
            let destinatario = bersaglio.destinatario()?;
            let utente =
                manutenzione::promuovi_amministratore(archivio.utenti.as_ref(), &destinatario)
                    .await?;
            println!("{} ({}) è amministratore.", utente.email, utente.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definizione_cli_valida() {
        Cli::command().debug_assert();
    }

    #[test]
    fn svuota_accetta_piu_collezioni() {
        let cli = Cli::try_parse_from(["manutenzione", "svuota", "pagamenti", "annunci", "--batch", "50", "--si"])
            .unwrap();
        match cli.comando {
            Comando::Svuota { collezioni, batch, si } => {
                assert_eq!(
                    collezioni,
                    vec![CollezioneSvuotabile::Pagamenti, CollezioneSvuotabile::Annunci]
                );
                assert_eq!(batch, 50);
                assert!(si);
            }
            altro => panic!("comando inatteso: {altro:?}"),
        }
    }

    #[test]
    fn promuovi_richiede_un_solo_bersaglio() {
        assert!(Cli::try_parse_from(["manutenzione", "promuovi"]).is_err());
        assert!(Cli::try_parse_from(["manutenzione", "promuovi", "--email", "a@b.it", "--id", "x"]).is_err());
        assert!(Cli::try_parse_from(["manutenzione", "promuovi", "--id", "x"]).is_ok());
    }
}
