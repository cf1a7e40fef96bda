use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Value written into the sidecar for optional fields the catalog did not provide.
pub const PLACEHOLDER: &str = "N/A";

/// Poster provider adapter selectable as primary or secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// OMDb, queried by IMDb identifier with an API key.
    KeyedApi,
    /// The title search catalog also used to build the sidecar.
    Catalog,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyedApi => "keyed-api",
            Self::Catalog => "catalog",
        }
    }

    /// The adapter to fall back to when this one fails.
    pub fn other(self) -> Self {
        match self {
            Self::KeyedApi => Self::Catalog,
            Self::Catalog => Self::KeyedApi,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyed-api" | "keyed_api" | "omdb" => Ok(Self::KeyedApi),
            "catalog" | "imdb" | "tmdb" => Ok(Self::Catalog),
            other => Err(format!(
                "unknown provider '{other}' (expected 'keyed-api' or 'catalog')"
            )),
        }
    }
}

/// A directory directly under the library root, named after the movie it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFolder {
    pub path: PathBuf,
    pub name: String,
}

impl MediaFolder {
    /// Build a folder from its path; `None` when the path has no final segment.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self { path, name })
    }
}

/// Descriptive metadata persisted in a folder's sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: Option<String>,
    pub year: Option<String>,
    pub plot: String,
    pub rating: String,
    /// Cover URL reported by the catalog, independent of any provider lookup.
    pub poster_url: Option<String>,
    /// Prefixed identifier, e.g. `tt1375666`.
    pub imdb_id: Option<String>,
}

/// What happened to a single provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// New poster bytes were written.
    Fetched,
    /// Poster already on disk and overwriting is disabled.
    AlreadyPresent,
    /// The adapter reported no poster for this title.
    NotFound,
    /// The adapter lookup itself failed (network, API error, bad response).
    LookupFailed(String),
    /// A poster URL was found but downloading or saving it failed.
    FetchFailed(String),
}

/// Result of asking one provider for a poster, consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    pub source: ProviderKind,
    pub poster_url: Option<String>,
    pub status: AttemptStatus,
}

impl ProviderOutcome {
    pub fn success(&self) -> bool {
        self.status == AttemptStatus::Fetched
    }
}

/// Why a folder was skipped before any poster attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The catalog search returned no candidates.
    LookupNotFound,
    /// The catalog could not be queried.
    LookupFailed(String),
    /// The sidecar could not be written.
    SidecarWriteFailed(String),
    /// The sidecar lacks an identifier or a title.
    MissingIdentity,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LookupNotFound => f.write_str("no catalog match"),
            Self::LookupFailed(e) => write!(f, "catalog lookup failed: {e}"),
            Self::SidecarWriteFailed(e) => write!(f, "sidecar write failed: {e}"),
            Self::MissingIdentity => f.write_str("sidecar is missing identifier or title"),
        }
    }
}

/// Terminal state of one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    WithPoster { source: ProviderKind, url: String },
    /// Existing poster left in place; no further provider was tried.
    PosterKept { source: ProviderKind },
    NoPoster,
    Skipped(SkipReason),
}

/// Counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub with_poster: usize,
    pub poster_kept: usize,
    pub no_poster: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FolderOutcome) {
        self.processed += 1;
        match outcome {
            FolderOutcome::WithPoster { .. } => self.with_poster += 1,
            FolderOutcome::PosterKept { .. } => self.poster_kept += 1,
            FolderOutcome::NoPoster => self.no_poster += 1,
            FolderOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}
