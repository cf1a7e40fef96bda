use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use posterfin_core::config::PipelineConfig;
use posterfin_core::types::ProviderKind;

/// Write movie.nfo sidecars and folder.jpg posters for every movie folder under a root.
#[derive(Debug, Parser)]
#[command(name = "posterfin", version)]
pub struct Args {
    /// Library root; each direct subdirectory is one movie.
    #[arg(long, env = "POSTERFIN_ROOT", value_name = "DIR")]
    pub root: PathBuf,

    /// Poster provider tried first (`keyed-api` or `catalog`).
    #[arg(long, env = "POSTERFIN_PRIMARY", default_value = "keyed-api", value_parser = parse_provider)]
    pub primary: ProviderKind,

    /// Poster provider tried when the primary fails; defaults to the other one.
    #[arg(long, env = "POSTERFIN_SECONDARY", value_parser = parse_provider)]
    pub secondary: Option<ProviderKind>,

    /// Replace posters that already exist.
    #[arg(long, env = "POSTERFIN_OVERWRITE")]
    pub overwrite: bool,

    #[arg(long, env = "POSTERFIN_OMDB_KEY", hide_env_values = true)]
    pub omdb_key: Option<String>,

    #[arg(long, env = "POSTERFIN_TMDB_KEY", hide_env_values = true)]
    pub tmdb_key: Option<String>,

    /// Timeout for each poster download.
    #[arg(long, env = "POSTERFIN_FETCH_TIMEOUT_SECS", default_value_t = 5)]
    pub fetch_timeout_secs: u64,

    /// Timeout for each catalog or OMDb request.
    #[arg(long, env = "POSTERFIN_LOOKUP_TIMEOUT_SECS", default_value_t = 30)]
    pub lookup_timeout_secs: u64,

    #[arg(long, env = "POSTERFIN_TMDB_URL", hide = true)]
    pub tmdb_url: Option<String>,

    #[arg(long, env = "POSTERFIN_TMDB_IMAGE_URL", hide = true)]
    pub tmdb_image_url: Option<String>,

    #[arg(long, env = "POSTERFIN_OMDB_URL", hide = true)]
    pub omdb_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

fn parse_provider(s: &str) -> Result<ProviderKind, String> {
    s.parse()
}

impl Args {
    pub fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            root_folder: self.root,
            primary_provider: self.primary,
            secondary_provider: self.secondary.unwrap_or(self.primary.other()),
            overwrite_existing: self.overwrite,
            omdb_api_key: self.omdb_key,
            tmdb_api_key: self.tmdb_key,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
            tmdb_base_url: self.tmdb_url,
            tmdb_image_base_url: self.tmdb_image_url,
            omdb_base_url: self.omdb_url,
        }
    }
}
