//! In-memory catalog and provider doubles for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use posterfin_core::types::ProviderKind;

use crate::provider::{CatalogCandidate, CatalogLookup, PosterProvider, PosterQuery, QueryKind};
use crate::{CatalogEntry, MetadataError};

pub fn candidate(reference: &str, title: &str, year: Option<&str>) -> CatalogCandidate {
    CatalogCandidate {
        reference: reference.to_string(),
        title: title.to_string(),
        year: year.map(str::to_string),
        cover_url: None,
    }
}

/// Catalog answering from fixed tables; unknown queries return no candidates.
#[derive(Default)]
pub struct FakeCatalog {
    searches: HashMap<String, Vec<CatalogCandidate>>,
    entries: HashMap<String, CatalogEntry>,
    failing: bool,
    search_calls: AtomicUsize,
    full_fetches: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_search(mut self, query: &str, hits: Vec<CatalogCandidate>) -> Self {
        self.searches.insert(query.to_string(), hits);
        self
    }

    pub fn with_entry(mut self, reference: &str, entry: CatalogEntry) -> Self {
        self.entries.insert(reference.to_string(), entry);
        self
    }

    /// Every call fails with a network error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn full_fetches(&self) -> usize {
        self.full_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogLookup for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<CatalogCandidate>, MetadataError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(MetadataError::Network("catalog unreachable".into()));
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }

    async fn fetch_full(&self, candidate: &CatalogCandidate) -> Result<CatalogEntry, MetadataError> {
        self.full_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(MetadataError::Network("catalog unreachable".into()));
        }
        self.entries
            .get(&candidate.reference)
            .cloned()
            .ok_or(MetadataError::NotFound)
    }
}

/// Provider returning a scripted answer and recording the queries it saw.
pub struct FakeProvider {
    kind: ProviderKind,
    answer: Result<Option<String>, MetadataError>,
    queries: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(kind: ProviderKind, answer: Result<Option<String>, MetadataError>) -> Self {
        Self {
            kind,
            answer,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn found(kind: ProviderKind, url: &str) -> Self {
        Self::new(kind, Ok(Some(url.to_string())))
    }

    pub fn not_found(kind: ProviderKind) -> Self {
        Self::new(kind, Ok(None))
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl PosterProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn query_kind(&self) -> QueryKind {
        match self.kind {
            ProviderKind::KeyedApi => QueryKind::Identifier,
            ProviderKind::Catalog => QueryKind::TitleYear,
        }
    }

    async fn poster_url(&self, query: &PosterQuery<'_>) -> Result<Option<String>, MetadataError> {
        if let Ok(mut seen) = self.queries.lock() {
            seen.push(query.to_string());
        }
        self.answer.clone()
    }
}
