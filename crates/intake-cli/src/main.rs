//! Intake CLI: ingest local files or URLs and delete stored files.
//!
//! Configuration comes from `FILE_UPLOAD_*` environment variables (a `.env` file is read
//! when present). Results are printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use intake_cli::{build_service, init_tracing, print_json, TransferArgs};
use intake_core::models::DeleteRequest;
use intake_core::Config;
use intake_services::{FilePayload, UploadSource};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake", about = "File ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more local files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        args: TransferArgs,
    },
    /// Download one or more URLs and store them
    Fetch {
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        args: TransferArgs,
        /// Download in one request instead of byte ranges
        #[arg(long)]
        plain: bool,
    },
    /// Delete stored files by record id or storage path
    Delete {
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let service = build_service(config).await?;

    match cli.command {
        Commands::Upload { files, args } => {
            let mut payloads = Vec::with_capacity(files.len());
            for file in &files {
                let payload = FilePayload::from_path(file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                payloads.push(payload);
            }
            let source = if payloads.len() == 1 {
                UploadSource::File(payloads.remove(0))
            } else {
                UploadSource::Files(payloads)
            };
            let outcome = service.upload(source, args.to_options()).await?;
            print_json(&outcome)?;
        }
        Commands::Fetch {
            mut urls,
            args,
            plain,
        } => {
            let mut options = args.to_options();
            if plain {
                options.fetch.chunked = Some(false);
            }
            let source = if urls.len() == 1 {
                UploadSource::Url(urls.remove(0))
            } else {
                UploadSource::Urls(urls)
            };
            let outcome = service.upload(source, options).await?;
            print_json(&outcome)?;
        }
        Commands::Delete { mut targets } => {
            let request = if targets.len() == 1 {
                DeleteRequest::One(targets.remove(0))
            } else {
                DeleteRequest::Many(targets)
            };
            let outcome = service.delete(request).await?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}
