use anyhow::Context;
use clap::Args;
use intake_core::models::UploadOptions;
use intake_core::Config;
use intake_db::{create_pool, run_migrations, FileRepository, PgFileRepository};
use intake_services::FileUploadService;
use intake_storage::create_disks;
use serde::Serialize;
use std::sync::Arc;

/// Options shared by the `upload` and `fetch` commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TransferArgs {
    /// Folder under the base path
    #[arg(long)]
    pub folder: Option<String>,
    /// Named disk to store on
    #[arg(long)]
    pub disk: Option<String>,
    /// Re-encode images to this format (jpeg, png, webp, avif, gif, bmp)
    #[arg(long)]
    pub convert_to: Option<String>,
    /// Field name used to pick validation rules
    #[arg(long)]
    pub field: Option<String>,
    /// Owner of the upload, for quotas and per-user folders
    #[arg(long)]
    pub user: Option<i64>,
}

impl TransferArgs {
    pub fn to_options(&self) -> UploadOptions {
        UploadOptions {
            folder_name: self.folder.clone(),
            disk: self.disk.clone(),
            convert_to: self.convert_to.clone(),
            field_name: self.field.clone(),
            user_id: self.user,
            ..Default::default()
        }
    }
}

/// Build the service from configuration: disks, then the metadata store when enabled.
pub async fn build_service(config: Config) -> anyhow::Result<FileUploadService> {
    let disks = create_disks(&config)
        .await
        .context("Failed to initialise storage disks")?;

    let repository: Option<Arc<dyn FileRepository>> = if config.database.enabled {
        let pool = create_pool(&config.database).await?;
        run_migrations(&pool).await?;
        Some(Arc::new(PgFileRepository::new(pool)))
    } else {
        None
    };

    FileUploadService::new(config, disks, repository).context("Invalid configuration")
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
