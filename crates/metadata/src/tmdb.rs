//! TMDB (The Movie Database) catalog client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use std::time::Duration;

use tracing::debug;

use crate::provider::{CatalogCandidate, CatalogLookup};
use crate::{CatalogEntry, MetadataError};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

pub struct TmdbClient {
    api_key: String,
    base_url: String,
    image_base: String,
    client: reqwest::Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self::with_client(api_key, reqwest::Client::new())
    }

    /// Client whose requests give up after `timeout`.
    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Provider(format!("build HTTP client: {e}")))?;
        Ok(Self::with_client(api_key, client))
    }

    fn with_client(api_key: String, client: reqwest::Client) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            image_base: IMAGE_BASE.to_string(),
            client,
        }
    }

    /// Point the client at another API host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Prefix used to build poster URLs from TMDB image paths.
    pub fn with_image_base(mut self, image_base: &str) -> Self {
        self.image_base = image_base.trim_end_matches('/').to_string();
        self
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, MetadataError> {
        let mut all_params = vec![("api_key", self.api_key.as_str())];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "TMDB request");

        let resp = self.client.get(&url).query(&all_params).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(MetadataError::Provider(format!(
                "TMDB returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| MetadataError::Provider(format!("parse JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl CatalogLookup for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<CatalogCandidate>, MetadataError> {
        let data = self.get_json("/search/movie", &[("query", query)]).await?;
        Ok(parse_search_results(&data, &self.image_base))
    }

    async fn fetch_full(&self, candidate: &CatalogCandidate) -> Result<CatalogEntry, MetadataError> {
        let data = self
            .get_json(&format!("/movie/{}", candidate.reference), &[])
            .await?;
        Ok(parse_movie_entry(&data, &self.image_base))
    }
}

fn year_of(date: Option<&str>) -> Option<String> {
    date.and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(|y| y.to_string())
}

fn non_empty(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_search_results(data: &serde_json::Value, image_base: &str) -> Vec<CatalogCandidate> {
    let results = data["results"].as_array().cloned().unwrap_or_default();

    results
        .iter()
        .take(10)
        .filter_map(|r| {
            let id = r["id"].as_u64()?;
            Some(CatalogCandidate {
                reference: id.to_string(),
                title: r["title"].as_str().unwrap_or("Unknown").to_string(),
                year: year_of(r["release_date"].as_str()),
                cover_url: r["poster_path"]
                    .as_str()
                    .map(|p| format!("{image_base}/w500{p}")),
            })
        })
        .collect()
}

fn parse_movie_entry(data: &serde_json::Value, image_base: &str) -> CatalogEntry {
    let votes = data["vote_count"].as_u64().unwrap_or(0);

    CatalogEntry {
        id: non_empty(&data["imdb_id"]).map(|id| id.trim_start_matches("tt").to_string()),
        title: non_empty(&data["title"]),
        year: year_of(data["release_date"].as_str()),
        plot: non_empty(&data["overview"]),
        rating: data["vote_average"]
            .as_f64()
            .filter(|_| votes > 0)
            .map(|r| format!("{r:.1}")),
        cover_url: data["poster_path"]
            .as_str()
            .map(|p| format!("{image_base}/original{p}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_movie_entry_from_json() {
        let json = serde_json::json!({
            "id": 27205,
            "imdb_id": "tt1375666",
            "title": "Inception",
            "overview": "A thief who steals corporate secrets...",
            "release_date": "2010-07-16",
            "vote_average": 8.369,
            "vote_count": 35000,
            "poster_path": "/poster.jpg"
        });

        let entry = parse_movie_entry(&json, IMAGE_BASE);
        assert_eq!(entry.id.as_deref(), Some("1375666"));
        assert_eq!(entry.title.as_deref(), Some("Inception"));
        assert_eq!(entry.year.as_deref(), Some("2010"));
        assert_eq!(entry.rating.as_deref(), Some("8.4"));
        assert_eq!(
            entry.cover_url.as_deref(),
            Some("https://image.tmdb.org/t/p/original/poster.jpg")
        );
    }

    #[test]
    fn parse_movie_entry_with_gaps() {
        let json = serde_json::json!({
            "id": 1,
            "imdb_id": null,
            "title": "Obscure",
            "overview": "",
            "release_date": "",
            "vote_average": 0.0,
            "vote_count": 0,
            "poster_path": null
        });

        let entry = parse_movie_entry(&json, IMAGE_BASE);
        assert_eq!(entry.id, None);
        assert_eq!(entry.year, None);
        assert_eq!(entry.plot, None);
        assert_eq!(entry.rating, None);
        assert_eq!(entry.cover_url, None);
    }

    #[test]
    fn parse_search_results_keeps_catalog_order() {
        let json = serde_json::json!({
            "results": [
                { "id": 27205, "title": "Inception", "release_date": "2010-07-15", "poster_path": "/a.jpg" },
                { "id": 64956, "title": "Inception: The Cobol Job", "release_date": "2010-12-07" },
                { "title": "no id, dropped" }
            ]
        });

        let hits = parse_search_results(&json, IMAGE_BASE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].reference, "27205");
        assert_eq!(hits[0].year.as_deref(), Some("2010"));
        assert!(hits[0].cover_url.as_ref().unwrap().ends_with("/w500/a.jpg"));
        assert_eq!(hits[1].cover_url, None);
    }

    #[test]
    fn empty_search_yields_no_candidates() {
        let json = serde_json::json!({ "page": 1, "results": [] });
        assert!(parse_search_results(&json, IMAGE_BASE).is_empty());
    }
}
