pub mod catalog;
pub mod omdb;
pub mod provider;
pub mod resolver;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod tmdb;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("not found")]
    NotFound,
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Full catalog record for one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    /// Numeric IMDb identifier without the `tt` prefix.
    pub id: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub plot: Option<String>,
    pub rating: Option<String>,
    pub cover_url: Option<String>,
}
