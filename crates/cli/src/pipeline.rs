//! Per-folder enrichment: resolve metadata, write the sidecar, then fetch a
//! poster from the primary provider, falling back to the secondary once.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use posterfin_core::config::PipelineConfig;
use posterfin_core::error::ConfigError;
use posterfin_core::types::{
    AttemptStatus, FolderOutcome, MediaFolder, ProviderKind, ProviderOutcome, RunSummary,
    SkipReason,
};
use posterfin_metadata::MetadataError;
use posterfin_metadata::catalog::CatalogPosterProvider;
use posterfin_metadata::omdb::OmdbClient;
use posterfin_metadata::provider::{CatalogLookup, PosterProvider, PosterQuery};
use posterfin_metadata::resolver::MetadataResolver;
use posterfin_metadata::tmdb::TmdbClient;
use posterfin_scanner::nfo;
use tracing::{debug, info, warn};

use crate::poster::{FetchStatus, HttpDownloader, PosterFetcher};

pub struct Pipeline {
    config: PipelineConfig,
    resolver: MetadataResolver,
    providers: HashMap<ProviderKind, Arc<dyn PosterProvider>>,
    fetcher: PosterFetcher,
}

impl Pipeline {
    /// Assemble a pipeline; both configured providers must be present.
    pub fn new(
        config: PipelineConfig,
        resolver: MetadataResolver,
        providers: Vec<Arc<dyn PosterProvider>>,
        fetcher: PosterFetcher,
    ) -> Result<Self, ConfigError> {
        if config.primary_provider == config.secondary_provider {
            return Err(ConfigError::DuplicateProvider(config.primary_provider));
        }
        let providers: HashMap<_, _> = providers.into_iter().map(|p| (p.kind(), p)).collect();
        for kind in config.providers() {
            if !providers.contains_key(&kind) {
                return Err(ConfigError::MissingProvider(kind));
            }
        }

        Ok(Self {
            config,
            resolver,
            providers,
            fetcher,
        })
    }

    /// Build the HTTP-backed pipeline described by a validated config.
    pub fn from_config(config: PipelineConfig) -> anyhow::Result<Self> {
        let tmdb_key = config
            .tmdb_key()
            .ok_or(ConfigError::MissingApiKey { service: "TMDB" })?;
        let mut tmdb = TmdbClient::with_timeout(tmdb_key.to_string(), config.lookup_timeout)
            .context("failed to create TMDB client")?;
        if let Some(url) = config.tmdb_base_url.as_deref() {
            tmdb = tmdb.with_base_url(url);
        }
        if let Some(url) = config.tmdb_image_base_url.as_deref() {
            tmdb = tmdb.with_image_base(url);
        }
        let catalog: Arc<dyn CatalogLookup> = Arc::new(tmdb);

        let mut providers: Vec<Arc<dyn PosterProvider>> =
            vec![Arc::new(CatalogPosterProvider::new(catalog.clone()))];
        if config.uses(ProviderKind::KeyedApi) {
            let omdb_key = config
                .omdb_key()
                .ok_or(ConfigError::MissingApiKey { service: "OMDb" })?;
            let mut omdb = OmdbClient::with_timeout(omdb_key.to_string(), config.lookup_timeout)
                .context("failed to create OMDb client")?;
            if let Some(url) = config.omdb_base_url.as_deref() {
                omdb = omdb.with_base_url(url);
            }
            providers.push(Arc::new(omdb));
        }

        let downloader =
            HttpDownloader::new(config.fetch_timeout).context("failed to create HTTP client")?;

        Ok(Self::new(
            config,
            MetadataResolver::new(catalog),
            providers,
            PosterFetcher::new(Arc::new(downloader)),
        )?)
    }

    /// Process folders one after another. Failures never stop the run.
    pub async fn run(&self, folders: &[MediaFolder]) -> RunSummary {
        let mut summary = RunSummary::default();
        for folder in folders {
            let outcome = self.process_folder(folder).await;
            if let FolderOutcome::Skipped(reason) = &outcome {
                debug!(folder = %folder.name, reason = %reason, "folder skipped");
            }
            summary.record(&outcome);
        }

        info!(
            processed = summary.processed,
            with_poster = summary.with_poster,
            poster_kept = summary.poster_kept,
            no_poster = summary.no_poster,
            skipped = summary.skipped,
            "run complete"
        );
        summary
    }

    pub async fn process_folder(&self, folder: &MediaFolder) -> FolderOutcome {
        info!(folder = %folder.path.display(), "processing");

        let record = match self.resolver.resolve(&folder.name).await {
            Ok(record) => record,
            Err(MetadataError::NotFound) => {
                info!(folder = %folder.name, "movie not found in catalog, skipping");
                return FolderOutcome::Skipped(SkipReason::LookupNotFound);
            }
            Err(err) => {
                warn!(folder = %folder.name, error = %err, "catalog lookup failed, skipping");
                return FolderOutcome::Skipped(SkipReason::LookupFailed(err.to_string()));
            }
        };

        let nfo_path = match nfo::write_nfo(&folder.path, &record) {
            Ok(path) => {
                info!(path = %path.display(), "sidecar written");
                path
            }
            Err(err) => {
                warn!(folder = %folder.path.display(), error = %err, "failed to write sidecar, skipping");
                return FolderOutcome::Skipped(SkipReason::SidecarWriteFailed(err.to_string()));
            }
        };

        // The sidecar on disk is the source of truth for provider lookups.
        let imdb_id = nfo::read_imdb_id(&nfo_path);
        let (title, year) = nfo::read_title_year(&nfo_path);
        let (Some(imdb_id), Some(title)) = (imdb_id, title) else {
            info!(folder = %folder.name, "sidecar is missing IMDb ID or title, skipping");
            return FolderOutcome::Skipped(SkipReason::MissingIdentity);
        };

        let query = |kind| Lookup {
            kind,
            imdb_id: &imdb_id,
            title: &title,
            year: year.as_deref(),
        };

        let primary = self.attempt(folder, query(self.config.primary_provider)).await;
        if let Some(done) = finished(&primary) {
            return done;
        }

        info!(
            folder = %folder.name,
            fallback = %self.config.secondary_provider,
            "trying fallback provider"
        );
        let secondary = self
            .attempt(folder, query(self.config.secondary_provider))
            .await;
        finished(&secondary).unwrap_or(FolderOutcome::NoPoster)
    }

    async fn attempt(&self, folder: &MediaFolder, lookup: Lookup<'_>) -> ProviderOutcome {
        let source = lookup.kind;
        let outcome = |status, poster_url| ProviderOutcome {
            source,
            poster_url,
            status,
        };

        let Some(provider) = self.providers.get(&source) else {
            return outcome(
                AttemptStatus::LookupFailed(format!("no adapter for {source}")),
                None,
            );
        };
        let query = PosterQuery::build(
            provider.query_kind(),
            lookup.imdb_id,
            lookup.title,
            lookup.year,
        );

        let url = match provider.poster_url(&query).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                info!(source = %source, query = %query, "poster not found");
                return outcome(AttemptStatus::NotFound, None);
            }
            Err(err) => {
                warn!(source = %source, query = %query, error = %err, "poster lookup failed");
                return outcome(AttemptStatus::LookupFailed(err.to_string()), None);
            }
        };

        let status = match self
            .fetcher
            .fetch(&url, &folder.path, self.config.overwrite_existing)
            .await
        {
            Ok(FetchStatus::Saved(path)) => {
                info!(source = %source, path = %path.display(), "poster saved");
                AttemptStatus::Fetched
            }
            Ok(FetchStatus::Skipped(path)) => {
                info!(
                    source = %source,
                    path = %path.display(),
                    "poster already exists and overwrite is disabled, skipping"
                );
                AttemptStatus::AlreadyPresent
            }
            Err(err) => {
                warn!(source = %source, url = %url, error = %err, "failed to download poster");
                AttemptStatus::FetchFailed(err.to_string())
            }
        };
        outcome(status, Some(url))
    }
}

#[derive(Clone, Copy)]
struct Lookup<'a> {
    kind: ProviderKind,
    imdb_id: &'a str,
    title: &'a str,
    year: Option<&'a str>,
}

/// Terminal folder state for an attempt, `None` when the next provider should run.
fn finished(attempt: &ProviderOutcome) -> Option<FolderOutcome> {
    if attempt.success() {
        return attempt
            .poster_url
            .clone()
            .map(|url| FolderOutcome::WithPoster {
                source: attempt.source,
                url,
            });
    }
    (attempt.status == AttemptStatus::AlreadyPresent).then_some(FolderOutcome::PosterKept {
        source: attempt.source,
    })
}
