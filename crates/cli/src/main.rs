use anyhow::Result;
use clap::{Parser, Subcommand};
use disaster_dedup_core::DEFAULT_LOG_LIMIT;
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LLM_URL: &str = "http://127.0.0.1:8000";

#[derive(Parser)]
#[command(name = "disaster-dedup")]
#[command(about = "Near-duplicate detection and merge for disaster-event records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one dedup pass over the record table
    Run {
        /// Accept pairs at or above this cosine score without asking the LLM
        #[arg(long)]
        duplicate_threshold: Option<f32>,
        /// Lower edge of the band adjudicated by the LLM
        #[arg(long)]
        fuzzy_floor: Option<f32>,
        /// Commit the checked flags and the merges in one transaction
        #[arg(long)]
        single_transaction: bool,
    },
    /// Show recent dedup runs, newest first
    Logs {
        #[arg(short, long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
    /// Create or update the PostgreSQL schema
    Migrate,
}

pub(crate) fn get_database_url() -> Result<String> {
    std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))
}

pub(crate) fn get_api_key() -> Result<String> {
    std::env::var("DISASTER_DEDUP_LLM_API_KEY")
        .map_err(|_| anyhow::anyhow!("DISASTER_DEDUP_LLM_API_KEY environment variable must be set"))
}

pub(crate) fn get_base_url() -> String {
    std::env::var("DISASTER_DEDUP_LLM_URL").unwrap_or_else(|_| DEFAULT_LLM_URL.to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { duplicate_threshold, fuzzy_floor, single_transaction } => {
            commands::run::run(commands::run::RunArgs {
                duplicate_threshold,
                fuzzy_floor,
                single_transaction,
            })
            .await?;
        },
        Commands::Logs { limit } => commands::logs::run(limit).await?,
        Commands::Migrate => commands::migrate::run().await?,
    }

    Ok(())
}
