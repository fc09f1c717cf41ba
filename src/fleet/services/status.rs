//! Runtime freshness and display status for servers.

use crate::fleet::{
    domain::{Server, ServerId, ServerName},
    ports::{FleetRepository, FleetRepositoryError, VersionSource},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Service-level errors for status queries.
#[derive(Debug, Error)]
pub enum ServerStatusServiceError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] FleetRepositoryError),
    /// No server exists with the given identifier.
    #[error("server {0} not found")]
    NotFound(ServerId),
}

/// Result type for status service operations.
pub type ServerStatusServiceResult<T> = Result<T, ServerStatusServiceError>;

/// Summary of a server as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOverview {
    /// Server identifier.
    pub server_id: ServerId,
    /// Server name.
    pub name: ServerName,
    /// Display status token.
    pub status: String,
    /// Last reported runtime version.
    pub runtime_version: Option<String>,
    /// Whether the runtime is at least the latest known version.
    pub up_to_date: bool,
}

/// Answers freshness and display-status questions about servers.
///
/// Nothing is cached: every answer is computed from the stored server and
/// the version source at call time.
#[derive(Clone)]
pub struct ServerStatusService<R, V>
where
    R: FleetRepository,
    V: VersionSource,
{
    repository: Arc<R>,
    versions: Arc<V>,
}

impl<R, V> ServerStatusService<R, V>
where
    R: FleetRepository,
    V: VersionSource,
{
    /// Creates a new status service.
    #[must_use]
    pub const fn new(repository: Arc<R>, versions: Arc<V>) -> Self {
        Self {
            repository,
            versions,
        }
    }

    /// Looks up the latest runtime version, logging and swallowing failures.
    async fn latest_version(&self) -> Option<String> {
        match self.versions.latest_version().await {
            Ok(latest) => Some(latest),
            Err(err) => {
                warn!(error = %err, "latest runtime version unavailable");
                None
            }
        }
    }

    async fn find_server_or_error(&self, server_id: ServerId) -> ServerStatusServiceResult<Server> {
        self.repository
            .find_server(server_id)
            .await?
            .ok_or(ServerStatusServiceError::NotFound(server_id))
    }

    /// Returns whether the server runs at least the latest known version.
    ///
    /// An unknown current version, an unknown latest version, or a failing
    /// version source all yield `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStatusServiceError::NotFound`] when the server does not
    /// exist, or persistence errors.
    pub async fn is_up_to_date(&self, server_id: ServerId) -> ServerStatusServiceResult<bool> {
        let server = self.find_server_or_error(server_id).await?;
        let latest = self.latest_version().await;
        Ok(is_fresh(&server, latest.as_deref()))
    }

    /// Returns the display summary of one server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStatusServiceError::NotFound`] when the server does not
    /// exist, or persistence errors.
    pub async fn overview(&self, server_id: ServerId) -> ServerStatusServiceResult<ServerOverview> {
        let server = self.find_server_or_error(server_id).await?;
        let latest = self.latest_version().await;
        Ok(build_overview(&server, latest.as_deref()))
    }

    /// Returns display summaries for every server, consulting the version
    /// source once.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn overview_all(&self) -> ServerStatusServiceResult<Vec<ServerOverview>> {
        let servers = self.repository.list_servers().await?;
        let latest = self.latest_version().await;
        Ok(servers
            .iter()
            .map(|server| build_overview(server, latest.as_deref()))
            .collect())
    }
}

fn build_overview(server: &Server, latest: Option<&str>) -> ServerOverview {
    ServerOverview {
        server_id: server.id(),
        name: server.name().clone(),
        status: server.formatted_status().into_owned(),
        runtime_version: server.runtime_version().map(str::to_owned),
        up_to_date: is_fresh(server, latest),
    }
}

fn is_fresh(server: &Server, latest: Option<&str>) -> bool {
    latest.is_some_and(|version| server.is_up_to_date(version))
}
