use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use lendboard_rs::market_data::adapters::aave::AaveAdapter;
use lendboard_rs::market_data::normaliser::Normaliser;
use lendboard_rs::market_data::registry::Registry;
use lendboard_rs::market_data::router::Pipeline;
use lendboard_rs::persist::file::JsonFileStore;
use lendboard_rs::persist::postgres::PostgresRowSink;
use lendboard_rs::persist::rest::RestRowSink;
use lendboard_rs::persist::snapshot::to_rate_rows;
use lendboard_rs::persist::{RowSink, Snapshot, SnapshotStore};
use lendboard_rs::settings::Settings;
use lendboard_rs::{telemetry, PipelineError};

#[derive(Parser)]
#[command(name = "lendboard", version, about = "Ranked lending-market snapshot from the Aave GraphQL API")]
struct Cli {
    /// Settings file (TOML); defaults to ./lendboard.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Market registry document, overrides `markets_path`
    #[arg(long, global = true)]
    markets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, rank and replace the JSON snapshot document
    Snapshot {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch, rank and bulk insert flat rows into a time-series store
    Insert {
        #[arg(long, value_enum, default_value_t = InsertTarget::Rest)]
        target: InsertTarget,
    },
    /// Print the counts and top rows of an existing snapshot document
    Show {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InsertTarget {
    Rest,
    Postgres,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // load .env
    telemetry::init_tracing("info");
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e.downcast_ref::<PipelineError>().map(|p| p.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init_metrics().context("metrics exporter")?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(markets) = cli.markets {
        settings.markets_path = markets;
    }

    match cli.command {
        Command::Snapshot { out } => {
            let mut store = JsonFileStore::new(out.unwrap_or_else(|| settings.output_path.clone()));
            let snapshot = collect(&settings).await?;
            store.save_snapshot(&snapshot).await.map_err(PipelineError::from)?;
            println!(
                "Wrote {} with {} markets. Stats: {:?}",
                store.path().display(),
                snapshot.markets.len(),
                snapshot.counts
            );
        }
        Command::Insert { target } => {
            // Resolve the sink first so missing credentials fail before any fetch
            let sink = build_sink(&settings, target).await?;
            let snapshot = collect(&settings).await?;
            let rows = to_rate_rows(&snapshot);
            sink.insert_rows(&rows).await.map_err(PipelineError::from)?;
            println!("Inserted {} rows. Stats: {:?}", rows.len(), snapshot.counts);
        }
        Command::Show { path, top } => {
            let path = path.unwrap_or_else(|| settings.output_path.clone());
            let store = JsonFileStore::new(&path);
            let snapshot = store
                .load_snapshot()
                .await
                .map_err(PipelineError::from)?
                .ok_or_else(|| PipelineError::config(format!("no snapshot at {}", path.display())))?;
            show(&snapshot, top);
        }
    }
    Ok(())
}

async fn collect(settings: &Settings) -> Result<Snapshot, PipelineError> {
    let registry = Registry::load(&settings.markets_path, &settings.markets_namespace).await?;
    let adapter = AaveAdapter::new(&settings.api_url, settings.concurrency, settings.request_timeout())?;
    let pipeline = Pipeline::new(
        adapter,
        Normaliser::new(settings.stable_policy()),
        settings.concurrency,
        settings.default_min_tvl_usd,
    );
    pipeline.run(&registry).await
}

async fn build_sink(settings: &Settings, target: InsertTarget) -> Result<Box<dyn RowSink>, PipelineError> {
    match target {
        InsertTarget::Rest => {
            let (Some(url), Some(key)) = (&settings.rest_url, &settings.rest_key) else {
                return Err(PipelineError::config(
                    "rest_url and rest_key (or SUPABASE_URL and SUPABASE_SERVICE_KEY) must be set",
                ));
            };
            let sink = RestRowSink::new(url, key, &settings.rest_table, settings.request_timeout())?;
            Ok(Box::new(sink))
        }
        InsertTarget::Postgres => {
            let url = settings
                .database_url
                .as_deref()
                .ok_or_else(|| PipelineError::config("database_url (or DATABASE_URL) must be set"))?;
            let sink = PostgresRowSink::connect(url, &settings.db_table).await?;
            sink.ensure_table().await?;
            Ok(Box::new(sink))
        }
    }
}

fn show(snapshot: &Snapshot, top: usize) {
    let c = snapshot.counts;
    info!(
        updated_at = %snapshot.updated_at,
        min_tvl_usd = snapshot.min_tvl_usd,
        reserves_seen = c.reserves_seen,
        skipped_nulls = c.skipped_nulls,
        skipped_below_floor = c.skipped_below_floor,
        kept = c.kept,
        stable = c.stable,
        ethereum = c.ethereum,
        "Snapshot"
    );
    for (i, m) in snapshot.markets.iter().take(top).enumerate() {
        println!(
            "{:>3}. {:<10} {:<12} supply {:>7.3}%  borrow {:>7.3}%  util {:>5.1}%  tvl ${:>16.0}",
            i + 1,
            m.symbol,
            m.chain_name,
            m.supply_apy * 100.0,
            m.borrow_apy * 100.0,
            m.utilization * 100.0,
            m.tvl_usd
        );
    }
}
