//! OMDb keyed metadata API, used as a poster provider.
//!
//! https://www.omdbapi.com/

use std::time::Duration;

use posterfin_core::types::{PLACEHOLDER, ProviderKind};
use serde::Deserialize;
use tracing::debug;

use crate::MetadataError;
use crate::provider::{PosterProvider, PosterQuery, QueryKind};

const BASE_URL: &str = "https://www.omdbapi.com/";

pub struct OmdbClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl OmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Provider(format!("build HTTP client: {e}")))?;
        Ok(Self {
            client,
            ..Self::new(api_key)
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    async fn lookup(&self, imdb_id: &str) -> Result<OmdbResponse, MetadataError> {
        debug!(imdb_id = %imdb_id, "OMDb request");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("i", imdb_id), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "OMDb returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| MetadataError::Provider(format!("parse JSON: {e}")))
    }
}

/// Poster URL from an OMDb response; `None` for misses and the "N/A" sentinel.
fn poster_from_response(resp: &OmdbResponse) -> Option<String> {
    if resp.response != "True" {
        return None;
    }
    resp.poster
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != PLACEHOLDER)
        .map(|p| p.to_string())
}

#[async_trait::async_trait]
impl PosterProvider for OmdbClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::KeyedApi
    }

    fn query_kind(&self) -> QueryKind {
        QueryKind::Identifier
    }

    async fn poster_url(&self, query: &PosterQuery<'_>) -> Result<Option<String>, MetadataError> {
        let PosterQuery::Identifier(imdb_id) = query else {
            return Err(MetadataError::Provider(
                "OMDb lookups need an IMDb identifier".into(),
            ));
        };

        let resp = self.lookup(imdb_id).await?;
        if resp.response != "True" {
            debug!(
                imdb_id = %imdb_id,
                reason = resp.error.as_deref().unwrap_or("unknown"),
                "OMDb has no match"
            );
        }
        Ok(poster_from_response(&resp))
    }
}
