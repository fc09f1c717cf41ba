//! Server provisioning and ownership orchestration.

use crate::fleet::{
    domain::{
        AccessCredentials, App, AppName, DeployKey, DeployKeyId, FleetDomainError, RawStatus,
        Server, ServerAddress, ServerId, ServerKeypair, ServerName,
    },
    ports::{FleetRepository, FleetRepositoryError, KeyProvisionError, KeyProvisioner},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerRequest {
    /// Human-readable unique server name.
    pub name: String,
    /// Host name or IP address.
    pub address: String,
}

impl CreateServerRequest {
    /// Creates a server creation request.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Service-level errors for server provisioning.
#[derive(Debug, Error)]
pub enum ServerProvisioningServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] FleetDomainError),
    /// Key generation failed.
    #[error(transparent)]
    KeyProvisioning(#[from] KeyProvisionError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] FleetRepositoryError),
    /// No server exists with the given identifier.
    #[error("server {0} not found")]
    NotFound(ServerId),
}

/// Result type for provisioning service operations.
pub type ServerProvisioningServiceResult<T> = Result<T, ServerProvisioningServiceError>;

/// Creates and deletes servers and manages the records they own.
#[derive(Clone)]
pub struct ServerProvisioningService<R, K, C>
where
    R: FleetRepository,
    K: KeyProvisioner + 'static,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    keys: Arc<K>,
    clock: Arc<C>,
}

impl<R, K, C> ServerProvisioningService<R, K, C>
where
    R: FleetRepository,
    K: KeyProvisioner + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a new provisioning service.
    #[must_use]
    pub const fn new(repository: Arc<R>, keys: Arc<K>, clock: Arc<C>) -> Self {
        Self {
            repository,
            keys,
            clock,
        }
    }

    async fn find_server_or_error(
        &self,
        server_id: ServerId,
    ) -> ServerProvisioningServiceResult<Server> {
        self.repository
            .find_server(server_id)
            .await?
            .ok_or(ServerProvisioningServiceError::NotFound(server_id))
    }

    async fn generate_keypair(&self) -> ServerProvisioningServiceResult<ServerKeypair> {
        let keys = Arc::clone(&self.keys);
        let keypair = tokio::task::spawn_blocking(move || keys.generate())
            .await
            .map_err(KeyProvisionError::generation)??;
        Ok(keypair)
    }

    /// Creates a server with a freshly generated keypair.
    ///
    /// Name and address are validated and the name checked for uniqueness
    /// before any key material is generated; nothing is stored unless key
    /// generation succeeds.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid input,
    /// [`FleetRepositoryError::DuplicateServerName`] when the name is taken,
    /// and key provisioning or persistence errors.
    pub async fn create_server(
        &self,
        request: CreateServerRequest,
    ) -> ServerProvisioningServiceResult<Server> {
        let name = ServerName::new(request.name)?;
        let address = ServerAddress::new(request.address)?;

        if self.repository.find_server_by_name(&name).await?.is_some() {
            return Err(FleetRepositoryError::DuplicateServerName(name).into());
        }

        let keypair = self.generate_keypair().await?;
        let server = Server::new(name, address, keypair, &*self.clock);
        self.repository.create_server(&server).await?;

        info!(
            server_id = %server.id(),
            server_name = %server.name(),
            fingerprint = %server.keypair().fingerprint(),
            "server created"
        );
        Ok(server)
    }

    /// Finds a server by identifier.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn find_by_id(
        &self,
        server_id: ServerId,
    ) -> ServerProvisioningServiceResult<Option<Server>> {
        Ok(self.repository.find_server(server_id).await?)
    }

    /// Finds a server by name.
    ///
    /// # Errors
    ///
    /// Returns domain validation errors when the name is invalid and
    /// persistence errors from the repository.
    pub async fn find_by_name(
        &self,
        server_name: &str,
    ) -> ServerProvisioningServiceResult<Option<Server>> {
        let validated_name = ServerName::new(server_name)?;
        Ok(self.repository.find_server_by_name(&validated_name).await?)
    }

    /// Lists every server.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_all(&self) -> ServerProvisioningServiceResult<Vec<Server>> {
        Ok(self.repository.list_servers().await?)
    }

    /// Deletes a server along with its bindings, apps, and deploy keys.
    ///
    /// Returns `false` when the server did not exist.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn delete_server(&self, server_id: ServerId) -> ServerProvisioningServiceResult<bool> {
        let deleted = self.repository.delete_server(server_id).await?;
        if deleted {
            info!(server_id = %server_id, "server deleted");
        }
        Ok(deleted)
    }

    /// Stores the runtime version reported by the server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerProvisioningServiceError::NotFound`] when the server
    /// does not exist, or persistence errors.
    pub async fn record_runtime_version(
        &self,
        server_id: ServerId,
        runtime_version: Option<String>,
    ) -> ServerProvisioningServiceResult<Server> {
        let mut server = self.find_server_or_error(server_id).await?;
        server.record_runtime_version(runtime_version, &*self.clock);
        self.repository.update_server(&server).await?;
        debug!(
            server_id = %server_id,
            runtime_version = server.runtime_version().unwrap_or_default(),
            "runtime version recorded"
        );
        Ok(server)
    }

    /// Stores the raw status reported by orchestration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerProvisioningServiceError::NotFound`] when the server
    /// does not exist, or persistence errors.
    pub async fn record_raw_status(
        &self,
        server_id: ServerId,
        raw_status: RawStatus,
    ) -> ServerProvisioningServiceResult<Server> {
        let mut server = self.find_server_or_error(server_id).await?;
        server.record_raw_status(raw_status, &*self.clock);
        self.repository.update_server(&server).await?;
        debug!(server_id = %server_id, status = %server.raw_status(), "raw status recorded");
        Ok(server)
    }

    /// Authorises a deploy key on a server.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid key material,
    /// [`ServerProvisioningServiceError::NotFound`] when the server does not
    /// exist, and [`FleetRepositoryError::DuplicateDeployKey`] when the key is
    /// already authorised.
    pub async fn add_deploy_key(
        &self,
        server_id: ServerId,
        key_material: impl Into<String> + Send,
        title: Option<String>,
    ) -> ServerProvisioningServiceResult<DeployKey> {
        let deploy_key = DeployKey::new(server_id, key_material, title, &*self.clock)?;
        self.repository
            .add_deploy_key(&deploy_key)
            .await
            .map_err(|err| match err {
                FleetRepositoryError::ServerNotFound(id) => {
                    ServerProvisioningServiceError::NotFound(id)
                }
                other => other.into(),
            })?;
        info!(
            server_id = %server_id,
            fingerprint = deploy_key.fingerprint(),
            "deploy key added"
        );
        Ok(deploy_key)
    }

    /// Revokes a deploy key. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn remove_deploy_key(
        &self,
        deploy_key_id: DeployKeyId,
    ) -> ServerProvisioningServiceResult<bool> {
        Ok(self.repository.remove_deploy_key(deploy_key_id).await?)
    }

    /// Lists the deploy keys authorised on a server.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_deploy_keys(
        &self,
        server_id: ServerId,
    ) -> ServerProvisioningServiceResult<Vec<DeployKey>> {
        Ok(self.repository.list_deploy_keys(server_id).await?)
    }

    /// Records an app hosted on a server.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid name,
    /// [`ServerProvisioningServiceError::NotFound`] when the server does not
    /// exist, and [`FleetRepositoryError::DuplicateAppName`] when the server
    /// already hosts an app with that name.
    pub async fn add_app(
        &self,
        server_id: ServerId,
        app_name: &str,
    ) -> ServerProvisioningServiceResult<App> {
        let name = AppName::new(app_name)?;
        let app = App::new(server_id, name, &*self.clock);
        self.repository.add_app(&app).await.map_err(|err| match err {
            FleetRepositoryError::ServerNotFound(id) => ServerProvisioningServiceError::NotFound(id),
            other => other.into(),
        })?;
        debug!(server_id = %server_id, app = %app.name(), "app added");
        Ok(app)
    }

    /// Lists the apps hosted on a server.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_apps(&self, server_id: ServerId) -> ServerProvisioningServiceResult<Vec<App>> {
        Ok(self.repository.list_apps(server_id).await?)
    }

    /// Returns the public material deploy tooling needs to reach a server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerProvisioningServiceError::NotFound`] when the server
    /// does not exist, or persistence errors.
    pub async fn access_credentials(
        &self,
        server_id: ServerId,
    ) -> ServerProvisioningServiceResult<AccessCredentials> {
        let server = self.find_server_or_error(server_id).await?;
        let deploy_keys = self.repository.list_deploy_keys(server_id).await?;
        Ok(AccessCredentials::new(
            server.name().clone(),
            server.keypair().public_key().to_owned(),
            deploy_keys,
        ))
    }
}
