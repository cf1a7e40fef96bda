use anyhow::Context;
use clap::Parser;
use posterfin_cli::config::Args;
use posterfin_cli::pipeline::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = args.into_config();
    config.validate().context("invalid configuration")?;

    let folders = posterfin_scanner::walk::list_media_folders(&config.root_folder)
        .with_context(|| format!("failed to list {}", config.root_folder.display()))?;
    info!(
        root = %config.root_folder.display(),
        folders = folders.len(),
        primary = %config.primary_provider,
        secondary = %config.secondary_provider,
        overwrite = config.overwrite_existing,
        "starting run"
    );

    let pipeline = Pipeline::from_config(config)?;
    pipeline.run(&folders).await;

    info!("all done");
    Ok(())
}
