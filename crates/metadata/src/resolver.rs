use std::sync::Arc;

use posterfin_core::types::{MetadataRecord, PLACEHOLDER};
use tracing::debug;

use crate::MetadataError;
use crate::provider::CatalogLookup;

/// Turns a folder name into a metadata record via the catalog.
pub struct MetadataResolver {
    catalog: Arc<dyn CatalogLookup>,
}

impl MetadataResolver {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { catalog }
    }

    /// Search by `folder_name` and build a record from the first hit.
    ///
    /// Returns [`MetadataError::NotFound`] when the search is empty.
    pub async fn resolve(&self, folder_name: &str) -> Result<MetadataRecord, MetadataError> {
        let candidates = self.catalog.search_by_title(folder_name).await?;
        let Some(first) = candidates.first() else {
            return Err(MetadataError::NotFound);
        };
        debug!(
            query = %folder_name,
            reference = %first.reference,
            title = %first.title,
            "catalog match"
        );

        let entry = self.catalog.fetch_full(first).await?;

        Ok(MetadataRecord {
            title: entry.title.or_else(|| Some(first.title.clone())),
            year: entry.year.or_else(|| first.year.clone()),
            plot: entry.plot.unwrap_or_else(|| PLACEHOLDER.to_string()),
            rating: entry.rating.unwrap_or_else(|| PLACEHOLDER.to_string()),
            poster_url: entry.cover_url,
            imdb_id: entry.id.map(|id| format!("tt{id}")),
        })
    }
}
