use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::ProviderKind;

/// Settings for one enrichment run, handed to the pipeline at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub root_folder: PathBuf,
    pub primary_provider: ProviderKind,
    pub secondary_provider: ProviderKind,
    pub overwrite_existing: bool,
    pub omdb_api_key: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub fetch_timeout: Duration,
    pub lookup_timeout: Duration,
    /// Overrides for the service endpoints, `None` for the public APIs.
    pub tmdb_base_url: Option<String>,
    pub tmdb_image_base_url: Option<String>,
    pub omdb_base_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root_folder: PathBuf::from("."),
            primary_provider: ProviderKind::KeyedApi,
            secondary_provider: ProviderKind::Catalog,
            overwrite_existing: false,
            omdb_api_key: None,
            tmdb_api_key: None,
            fetch_timeout: Duration::from_secs(5),
            lookup_timeout: Duration::from_secs(30),
            tmdb_base_url: None,
            tmdb_image_base_url: None,
            omdb_base_url: None,
        }
    }
}

impl PipelineConfig {
    pub fn providers(&self) -> [ProviderKind; 2] {
        [self.primary_provider, self.secondary_provider]
    }

    pub fn uses(&self, kind: ProviderKind) -> bool {
        self.providers().contains(&kind)
    }

    /// Trimmed OMDb key, `None` when unset or blank.
    pub fn omdb_key(&self) -> Option<&str> {
        non_blank(self.omdb_api_key.as_deref())
    }

    /// Trimmed TMDB key, `None` when unset or blank.
    pub fn tmdb_key(&self) -> Option<&str> {
        non_blank(self.tmdb_api_key.as_deref())
    }

    /// Check the provider set and keys before any folder is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_provider == self.secondary_provider {
            return Err(ConfigError::DuplicateProvider(self.primary_provider));
        }
        if self.uses(ProviderKind::KeyedApi) && self.omdb_key().is_none() {
            return Err(ConfigError::MissingApiKey { service: "OMDb" });
        }
        // The catalog builds every sidecar, so its key is always needed.
        if self.tmdb_key().is_none() {
            return Err(ConfigError::MissingApiKey { service: "TMDB" });
        }
        if !self.root_folder.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.root_folder.clone()));
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config(root: PathBuf) -> PipelineConfig {
        PipelineConfig {
            root_folder: root,
            omdb_api_key: Some("omdb-key".into()),
            tmdb_api_key: Some("tmdb-key".into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(valid_config(dir.path().to_path_buf()).validate(), Ok(()));
    }

    #[test]
    fn blank_omdb_key_is_rejected_when_keyed_api_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid_config(dir.path().to_path_buf());
        config.omdb_api_key = Some("   ".into());
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingApiKey { service: "OMDb" })
        );
    }

    #[test]
    fn missing_tmdb_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid_config(dir.path().to_path_buf());
        config.tmdb_api_key = None;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingApiKey { service: "TMDB" })
        );
    }

    #[test]
    fn duplicate_provider_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid_config(dir.path().to_path_buf());
        config.secondary_provider = ProviderKind::KeyedApi;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateProvider(ProviderKind::KeyedApi))
        );
    }

    #[test]
    fn missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("does-not-exist");
        let config = valid_config(root.clone());
        assert_eq!(config.validate(), Err(ConfigError::RootNotDirectory(root)));
    }

    #[test]
    fn keys_are_trimmed() {
        let mut config = PipelineConfig::default();
        config.omdb_api_key = Some("  abc \n".into());
        assert_eq!(config.omdb_key(), Some("abc"));
    }
}
