//! Version source serving a configured latest version.

use crate::fleet::ports::{VersionSource, VersionSourceError};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Version source that returns whatever latest version it was last given.
///
/// A release-feed poller can keep it current through
/// [`StaticVersionSource::set_latest`].
#[derive(Debug, Clone, Default)]
pub struct StaticVersionSource {
    latest: Arc<RwLock<Option<String>>>,
}

impl StaticVersionSource {
    /// Creates a source with a known latest version.
    #[must_use]
    pub fn new(latest: impl Into<String>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(Some(latest.into()))),
        }
    }

    /// Creates a source with no known latest version.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Replaces the latest version.
    ///
    /// # Errors
    ///
    /// Returns [`VersionSourceError::Source`] when the lock is poisoned.
    pub fn set_latest(&self, latest: impl Into<String>) -> Result<(), VersionSourceError> {
        let mut guard = self
            .latest
            .write()
            .map_err(|err| VersionSourceError::failed(std::io::Error::other(err.to_string())))?;
        *guard = Some(latest.into());
        Ok(())
    }
}

#[async_trait]
impl VersionSource for StaticVersionSource {
    async fn latest_version(&self) -> Result<String, VersionSourceError> {
        let guard = self
            .latest
            .read()
            .map_err(|err| VersionSourceError::failed(std::io::Error::other(err.to_string())))?;
        guard.clone().ok_or(VersionSourceError::Unavailable)
    }
}
