//! Port supplying the latest known runtime version.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Source of the latest released runtime version, such as a release feed.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Returns the latest known version string.
    async fn latest_version(&self) -> Result<String, VersionSourceError>;
}

/// Errors returned by version sources.
#[derive(Debug, Clone, Error)]
pub enum VersionSourceError {
    /// No latest version is currently known.
    #[error("latest runtime version is unavailable")]
    Unavailable,

    /// The source failed to respond.
    #[error("version source failure: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),
}

impl VersionSourceError {
    /// Wraps a failure reported by the source.
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Arc::new(err))
    }
}
