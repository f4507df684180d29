mod agenda;
mod config;
mod ingest;
mod metadata;
mod package;
mod pdfinfo;
mod reconcile;
mod records;
mod report;
mod store;
mod utils;

use agenda::{AgendaLookup, AGENDA_LOOKUP_KEY};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::Config;
use pdfinfo::InfoScanExtractor;
use records::JsonRecordStore;
use report::ReportRange;
use std::path::PathBuf;
use store::FsObjectStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// docpack - package reconciliation for multilingual document intake
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root of the object store
    #[arg(short, long, env = "DOCPACK_STORE_ROOT")]
    store_root: PathBuf,

    /// Path to a JSON credentials file with accessKeyId/secretAccessKey
    #[arg(short, long, env = "DOCPACK_CREDENTIALS")]
    credentials: PathBuf,

    /// Identifier of the reconciliation record table
    #[arg(short, long, env = "DOCPACK_TABLE")]
    table: String,

    /// Namespace prefix packages are materialized under
    #[arg(long, env = "DOCPACK_PACKAGE_PREFIX", default_value = "Drop/packages")]
    package_prefix: String,

    /// Stop revisiting an incomplete package after this many passes.
    /// Unset means retry forever.
    #[arg(long, env = "DOCPACK_GIVE_UP_AFTER")]
    give_up_after: Option<u32>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Process the newest metadata batch in the drop location
    IngestLatest,
    /// Process a specific metadata file by object key
    IngestFile {
        /// Object key of the metadata file
        key: String,
    },
    /// Re-probe incomplete packages and promote the ones now complete
    Reconcile,
    /// Describe PDFs that arrived without metadata
    ParsePdfs,
    /// Report package completeness over a date range
    Report {
        /// Start date (YYYY-MM-DD); defaults to the first of this month
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let credentials = config::read_credentials(&args.credentials)
        .await
        .context("loading credentials")?;
    let config = Config {
        store_root: args.store_root,
        table: args.table,
        credentials,
        package_prefix: args.package_prefix,
        give_up_after: args.give_up_after,
    };

    let store = FsObjectStore::new(&config.store_root);
    let records = JsonRecordStore::new(config.store_root.join(&config.table));
    let agenda = AgendaLookup::load(&store, AGENDA_LOOKUP_KEY)
        .await
        .context("loading agenda lookup")?;

    match args.mode {
        Mode::IngestLatest => {
            let summary =
                ingest::ingest_latest(&store, &records, &agenda, &config.package_prefix).await?;
            summary.log();
        }
        Mode::IngestFile { key } => {
            let summary =
                ingest::ingest_key(&store, &records, &agenda, &config.package_prefix, &key)
                    .await?;
            summary.log();
        }
        Mode::Reconcile => {
            let summary =
                reconcile::reconcile_errors(&store, &records, &agenda, config.give_up_after)
                    .await?;
            summary.log();
        }
        Mode::ParsePdfs => {
            let summary =
                pdfinfo::parse_unlabeled_pdfs(&store, &records, &InfoScanExtractor).await?;
            info!(
                described = summary.described.len(),
                already_known = summary.already_known.len(),
                unreadable = summary.unreadable.len(),
                "parse-pdfs finished"
            );
        }
        Mode::Report { start, end } => {
            let range = match (start, end) {
                (Some(start), Some(end)) => ReportRange::new(start, end)?,
                (Some(start), None) => {
                    ReportRange::new(start, chrono::Utc::now().date_naive())?
                }
                (None, Some(end)) => {
                    ReportRange::new(ReportRange::month_to_date().start, end)?
                }
                (None, None) => ReportRange::month_to_date(),
            };
            let report = report::generate_report(&records, range).await?;
            println!("{report}");
        }
    }

    Ok(())
}
