//! Repository port for fleet persistence.

use crate::fleet::domain::{
    App, AppName, BindingStatus, DeployKey, DeployKeyId, Server, ServerId, ServerName, Service,
    ServiceBinding, ServiceId, ServiceName,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for fleet repository operations.
pub type FleetRepositoryResult<T> = Result<T, FleetRepositoryError>;

/// Persistence contract for servers and the records they own.
///
/// Implementations enforce two invariants that the services rely on:
/// at most one binding exists per `(server, service)` pair, and deleting a
/// server removes its bindings, apps, and deploy keys atomically.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Stores a newly created server.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::DuplicateServer`] when the ID already
    /// exists or [`FleetRepositoryError::DuplicateServerName`] when the name
    /// is taken.
    async fn create_server(&self, server: &Server) -> FleetRepositoryResult<()>;

    /// Persists version and status updates to an existing server.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::ServerNotFound`] when the server does
    /// not exist.
    async fn update_server(&self, server: &Server) -> FleetRepositoryResult<()>;

    /// Finds a server by identifier.
    async fn find_server(&self, server_id: ServerId) -> FleetRepositoryResult<Option<Server>>;

    /// Finds a server by unique name.
    async fn find_server_by_name(
        &self,
        server_name: &ServerName,
    ) -> FleetRepositoryResult<Option<Server>>;

    /// Returns every server.
    async fn list_servers(&self) -> FleetRepositoryResult<Vec<Server>>;

    /// Deletes a server together with its bindings, apps, and deploy keys.
    ///
    /// Returns `false` when the server did not exist.
    async fn delete_server(&self, server_id: ServerId) -> FleetRepositoryResult<bool>;

    /// Adds a service to the catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::DuplicateServiceName`] when the name is
    /// already registered.
    async fn register_service(&self, service: &Service) -> FleetRepositoryResult<()>;

    /// Finds a catalogue service by identifier.
    async fn find_service(&self, service_id: ServiceId) -> FleetRepositoryResult<Option<Service>>;

    /// Finds a catalogue service by name.
    async fn find_service_by_name(
        &self,
        service_name: &ServiceName,
    ) -> FleetRepositoryResult<Option<Service>>;

    /// Returns the whole service catalogue.
    async fn list_services(&self) -> FleetRepositoryResult<Vec<Service>>;

    /// Removes a service from the catalogue along with all its bindings.
    ///
    /// Returns `false` when the service did not exist.
    async fn remove_service(&self, service_id: ServiceId) -> FleetRepositoryResult<bool>;

    /// Stores `binding` unless its pair is already bound.
    ///
    /// Returns the binding that is live after the call: the stored one when
    /// the pair was already bound, otherwise `binding` itself.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::ServerNotFound`] or
    /// [`FleetRepositoryError::ServiceNotFound`] when either side is missing.
    async fn attach_service(&self, binding: &ServiceBinding)
    -> FleetRepositoryResult<ServiceBinding>;

    /// Finds the binding for a `(server, service)` pair.
    async fn find_binding(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<Option<ServiceBinding>>;

    /// Stores the status of `binding` if the stored binding still matches
    /// the snapshot it was derived from.
    ///
    /// The stored binding must have status `expected` and the same creation
    /// timestamp as `binding`; a detach followed by a re-attach therefore
    /// counts as a different binding.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::BindingNotFound`] when the pair is not
    /// bound or [`FleetRepositoryError::BindingConflict`] when the stored
    /// binding changed since it was read.
    async fn update_binding(
        &self,
        binding: &ServiceBinding,
        expected: BindingStatus,
    ) -> FleetRepositoryResult<()>;

    /// Removes the binding for a pair. Returns `false` when none existed.
    async fn detach_service(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<bool>;

    /// Returns all bindings owned by a server.
    async fn list_bindings(&self, server_id: ServerId)
    -> FleetRepositoryResult<Vec<ServiceBinding>>;

    /// Stores a deploy key for its server.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::ServerNotFound`] when the server does
    /// not exist or [`FleetRepositoryError::DuplicateDeployKey`] when the
    /// server already has a key with the same fingerprint.
    async fn add_deploy_key(&self, deploy_key: &DeployKey) -> FleetRepositoryResult<()>;

    /// Removes a deploy key. Returns `false` when it did not exist.
    async fn remove_deploy_key(&self, deploy_key_id: DeployKeyId) -> FleetRepositoryResult<bool>;

    /// Returns the deploy keys authorised for a server.
    async fn list_deploy_keys(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<DeployKey>>;

    /// Stores an app record for its server.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::ServerNotFound`] when the server does
    /// not exist or [`FleetRepositoryError::DuplicateAppName`] when the server
    /// already hosts an app with the same name.
    async fn add_app(&self, app: &App) -> FleetRepositoryResult<()>;

    /// Returns the apps hosted on a server.
    async fn list_apps(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<App>>;
}

/// Errors returned by fleet repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FleetRepositoryError {
    /// A server with the same identifier already exists.
    #[error("duplicate server identifier: {0}")]
    DuplicateServer(ServerId),

    /// A server with the same name already exists.
    #[error("duplicate server name: {0}")]
    DuplicateServerName(ServerName),

    /// The server was not found.
    #[error("server not found: {0}")]
    ServerNotFound(ServerId),

    /// A service with the same name is already in the catalogue.
    #[error("duplicate service name: {0}")]
    DuplicateServiceName(ServiceName),

    /// The service was not found.
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The `(server, service)` pair is not bound.
    #[error("service {service_id} is not attached to server {server_id}")]
    BindingNotFound {
        /// Server identifier.
        server_id: ServerId,
        /// Service identifier.
        service_id: ServiceId,
    },

    /// The binding changed between being read and being written.
    #[error("binding of service {service_id} on server {server_id} changed concurrently")]
    BindingConflict {
        /// Server identifier.
        server_id: ServerId,
        /// Service identifier.
        service_id: ServiceId,
    },

    /// The server already authorises a key with this fingerprint.
    #[error("server {server_id} already has deploy key {fingerprint}")]
    DuplicateDeployKey {
        /// Server identifier.
        server_id: ServerId,
        /// Fingerprint of the duplicate key.
        fingerprint: String,
    },

    /// The server already hosts an app with this name.
    #[error("server {server_id} already hosts app {name}")]
    DuplicateAppName {
        /// Server identifier.
        server_id: ServerId,
        /// Duplicate app name.
        name: AppName,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted fleet data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FleetRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<diesel::result::Error> for FleetRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
