//! FIRDS Ingest - ESMA instrument delta ETL

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use firds_common::checksum::sha256_hex;
use firds_common::logging::{init_logging, LogConfig, LogLevel};
use firds_ingest::{config::IngestConfig, extractor, handler, pipeline};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "firds-ingest")]
#[command(author, version, about = "ESMA FIRDS DLTINS to CSV ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the latest DLTINS file, flatten it and upload the CSV
    Run {
        /// Invocation event as JSON; only logged
        #[arg(short, long, default_value = "{}")]
        event: String,
    },

    /// Convert a local DLTINS archive or XML document to CSV
    Convert {
        /// Input zip archive or XML document
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the members of a local archive
    Inspect {
        /// Input zip archive
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("firds-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Run { event } => {
            let event: serde_json::Value =
                serde_json::from_str(&event).context("--event is not valid JSON")?;
            let config = IngestConfig::from_env()?;

            info!(bucket = %config.storage.bucket, key = %config.output_key, "Starting run");
            let response = handler::handle(&event, &config).await?;

            println!("{}", serde_json::to_string_pretty(&response)?);
        },
        Command::Convert { input, output } => {
            let summary = pipeline::convert_local(&input, &output)
                .await
                .with_context(|| format!("Failed to convert {}", input.display()))?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        },
        Command::Inspect { input } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            println!("sha256: {}", sha256_hex(&bytes));
            for name in extractor::list_members(&bytes)? {
                println!("{}", name);
            }
        },
    }

    Ok(())
}
