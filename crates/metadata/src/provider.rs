use posterfin_core::types::ProviderKind;

use crate::{CatalogEntry, MetadataError};

/// A title catalog that can be searched and then queried for a full record.
#[async_trait::async_trait]
pub trait CatalogLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Search by free-text title; candidates come back in catalog order.
    async fn search_by_title(&self, query: &str) -> Result<Vec<CatalogCandidate>, MetadataError>;

    /// Fetch the full record behind a search candidate.
    async fn fetch_full(&self, candidate: &CatalogCandidate) -> Result<CatalogEntry, MetadataError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogCandidate {
    /// Catalog-internal reference used by `fetch_full`.
    pub reference: String,
    pub title: String,
    pub year: Option<String>,
    pub cover_url: Option<String>,
}

/// Which lookup key an adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Identifier,
    TitleYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterQuery<'a> {
    Identifier(&'a str),
    TitleYear {
        title: &'a str,
        year: Option<&'a str>,
    },
}

impl<'a> PosterQuery<'a> {
    pub fn build(kind: QueryKind, imdb_id: &'a str, title: &'a str, year: Option<&'a str>) -> Self {
        match kind {
            QueryKind::Identifier => Self::Identifier(imdb_id),
            QueryKind::TitleYear => Self::TitleYear { title, year },
        }
    }
}

impl std::fmt::Display for PosterQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(id) => f.write_str(id),
            Self::TitleYear { title, year: Some(y) } => write!(f, "{title} ({y})"),
            Self::TitleYear { title, year: None } => f.write_str(title),
        }
    }
}

/// Resolves a poster URL for a title. Pure lookup; never writes files.
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn query_kind(&self) -> QueryKind;

    /// `Ok(None)` means the provider has no poster for this title.
    async fn poster_url(&self, query: &PosterQuery<'_>) -> Result<Option<String>, MetadataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_built_for_the_adapter_key() {
        assert_eq!(
            PosterQuery::build(QueryKind::Identifier, "tt1375666", "Inception", Some("2010")),
            PosterQuery::Identifier("tt1375666")
        );
        let q = PosterQuery::build(QueryKind::TitleYear, "tt1375666", "Inception", Some("2010"));
        assert_eq!(
            q,
            PosterQuery::TitleYear {
                title: "Inception",
                year: Some("2010")
            }
        );
        assert_eq!(q.to_string(), "Inception (2010)");
    }
}
