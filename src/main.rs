//! grandlivre entry point
//!
//! Thin driver around the statement engine: loads the configuration and
//! a ledger snapshot, generates the statements for the requested closing
//! date and prints the selected report as JSON on stdout.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use grandlivre_config::Config;
use grandlivre_core::generate_reports;
use grandlivre_store::{JsonFileStore, LedgerStore};
use grandlivre_utils::format_amount;
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "grandlivre")]
#[command(version = "0.1.0")]
#[command(about = "Financial statements from a double-entry ledger", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Ledger snapshot path (overrides the configuration)
    #[arg(short, long)]
    ledger: Option<PathBuf>,

    /// Closing date of exercise N, YYYY-MM-DD (overrides the configuration)
    #[arg(short = 'd', long)]
    closing_date: Option<NaiveDate>,

    /// Report to print: all, balance, bilan, resultat, tft, tvcp or annexe
    #[arg(short, long, default_value = "all")]
    report: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let rt = Runtime::new()?;

    rt.block_on(async {
        let config = if args.config.exists() {
            Config::load(args.config.clone())
                .with_context(|| format!("loading {}", args.config.display()))?
        } else {
            log::warn!(
                "configuration file {} not found, using defaults",
                args.config.display()
            );
            Config::default()
        };

        let ledger_path = args.ledger.unwrap_or_else(|| config.ledger_path());
        log::info!("loading ledger snapshot {}", ledger_path.display());
        let store = JsonFileStore::new(ledger_path);
        let snapshot = store.fetch_snapshot().await?;

        // the posting layer owns this invariant; re-checked here so a
        // corrupt snapshot is visible before anyone reads the statements
        let piece_warnings = snapshot.verify_pieces();
        if !piece_warnings.is_empty() {
            log::warn!(
                "{} pièce(s) déséquilibrée(s) in the snapshot",
                piece_warnings.len()
            );
        }

        let date_cloture = args
            .closing_date
            .or(config.reporting.closing_date)
            .ok_or_else(|| {
                anyhow!("no closing date: pass --closing-date or set reporting.closing_date")
            })?;

        let reports = generate_reports(&snapshot.comptes, &snapshot.ecritures, date_cloture)?;

        let currency = &config.currency;
        log::info!(
            "exercise {} closed: actif net {}, résultat {}",
            date_cloture,
            format_amount(
                reports.bilan.actif.total_n.net,
                currency.decimal_places,
                &currency.thousands_separator,
                &currency.decimal_separator
            ),
            format_amount(
                reports.compte_de_resultat.soldes.n.benefice_ou_perte,
                currency.decimal_places,
                &currency.thousands_separator,
                &currency.decimal_separator
            ),
        );

        let output = match args.report.as_str() {
            "all" => serde_json::to_string_pretty(&reports)?,
            "balance" => serde_json::to_string_pretty(&reports.balance)?,
            "bilan" => serde_json::to_string_pretty(&reports.bilan)?,
            "resultat" => serde_json::to_string_pretty(&reports.compte_de_resultat)?,
            "tft" => serde_json::to_string_pretty(&reports.tableau_flux)?,
            "tvcp" => serde_json::to_string_pretty(&reports.tableau_variation_capitaux)?,
            "annexe" => serde_json::to_string_pretty(&reports.tableau_immobilisations)?,
            other => bail!("unknown report '{other}'"),
        };
        println!("{output}");

        Ok(())
    })
}
