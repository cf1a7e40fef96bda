use std::sync::Arc;

use posterfin_core::types::ProviderKind;
use tracing::debug;

use crate::MetadataError;
use crate::provider::{CatalogCandidate, CatalogLookup, PosterProvider, PosterQuery, QueryKind};

/// Poster provider backed by the same title catalog that builds the sidecar.
pub struct CatalogPosterProvider {
    catalog: Arc<dyn CatalogLookup>,
}

impl CatalogPosterProvider {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }
}

/// First candidate whose year equals `year`, else the first candidate.
pub fn pick_by_year<'a>(
    candidates: &'a [CatalogCandidate],
    year: Option<&str>,
) -> Option<&'a CatalogCandidate> {
    year.and_then(|y| candidates.iter().find(|c| c.year.as_deref() == Some(y)))
        .or_else(|| candidates.first())
}

#[async_trait::async_trait]
impl PosterProvider for CatalogPosterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Catalog
    }

    fn query_kind(&self) -> QueryKind {
        QueryKind::TitleYear
    }

    async fn poster_url(&self, query: &PosterQuery<'_>) -> Result<Option<String>, MetadataError> {
        let PosterQuery::TitleYear { title, year } = *query else {
            return Err(MetadataError::Provider(
                "catalog lookups need a title".into(),
            ));
        };

        let candidates = self.catalog.search_by_title(title).await?;
        let Some(candidate) = pick_by_year(&candidates, year) else {
            debug!(title = %title, catalog = self.catalog.name(), "no search results");
            return Ok(None);
        };

        let entry = self.catalog.fetch_full(candidate).await?;
        Ok(entry.cover_url.or_else(|| candidate.cover_url.clone()))
    }
}
