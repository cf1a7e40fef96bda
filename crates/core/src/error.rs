use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProviderKind;

/// Startup configuration problems, reported once before any folder is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key for {service}")]
    MissingApiKey { service: &'static str },

    #[error("primary and secondary provider are both '{0}'")]
    DuplicateProvider(ProviderKind),

    #[error("no adapter registered for provider '{0}'")]
    MissingProvider(ProviderKind),

    #[error("root folder is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
}
