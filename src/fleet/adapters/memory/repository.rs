//! In-memory repository for fleet records.

use crate::fleet::{
    domain::{
        App, AppName, BindingStatus, DeployKey, DeployKeyId, Server, ServerId, ServerName,
        Service, ServiceBinding, ServiceId, ServiceName,
    },
    ports::{FleetRepository, FleetRepositoryError, FleetRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory fleet repository.
///
/// A single lock guards every collection, so attaching a service, writing a
/// binding status, and cascading a server deletion are linearisable with
/// respect to each other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFleetRepository {
    state: Arc<RwLock<InMemoryFleetState>>,
}

#[derive(Debug, Default)]
struct InMemoryFleetState {
    servers: HashMap<ServerId, Server>,
    server_names: HashMap<ServerName, ServerId>,
    services: HashMap<ServiceId, Service>,
    service_names: HashMap<ServiceName, ServiceId>,
    bindings: HashMap<(ServerId, ServiceId), ServiceBinding>,
    deploy_keys: HashMap<DeployKeyId, DeployKey>,
    apps: HashMap<(ServerId, AppName), App>,
}

impl InMemoryFleetState {
    fn ensure_server(&self, server_id: ServerId) -> FleetRepositoryResult<()> {
        if self.servers.contains_key(&server_id) {
            Ok(())
        } else {
            Err(FleetRepositoryError::ServerNotFound(server_id))
        }
    }
}

impl InMemoryFleetRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> FleetRepositoryResult<RwLockReadGuard<'_, InMemoryFleetState>> {
        self.state.read().map_err(|err| {
            FleetRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> FleetRepositoryResult<RwLockWriteGuard<'_, InMemoryFleetState>> {
        self.state.write().map_err(|err| {
            FleetRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl FleetRepository for InMemoryFleetRepository {
    async fn create_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        if state.servers.contains_key(&server.id()) {
            return Err(FleetRepositoryError::DuplicateServer(server.id()));
        }

        if state.server_names.contains_key(server.name()) {
            return Err(FleetRepositoryError::DuplicateServerName(
                server.name().clone(),
            ));
        }

        state.server_names.insert(server.name().clone(), server.id());
        state.servers.insert(server.id(), server.clone());
        Ok(())
    }

    async fn update_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        let stored_name = state
            .servers
            .get(&server.id())
            .ok_or(FleetRepositoryError::ServerNotFound(server.id()))?
            .name()
            .clone();

        if *server.name() != stored_name {
            if let Some(&indexed_id) = state.server_names.get(server.name())
                && indexed_id != server.id()
            {
                return Err(FleetRepositoryError::DuplicateServerName(
                    server.name().clone(),
                ));
            }

            state.server_names.remove(&stored_name);
            state.server_names.insert(server.name().clone(), server.id());
        }

        state.servers.insert(server.id(), server.clone());
        Ok(())
    }

    async fn find_server(&self, server_id: ServerId) -> FleetRepositoryResult<Option<Server>> {
        let state = self.read()?;
        Ok(state.servers.get(&server_id).cloned())
    }

    async fn find_server_by_name(
        &self,
        server_name: &ServerName,
    ) -> FleetRepositoryResult<Option<Server>> {
        let state = self.read()?;
        let server = state
            .server_names
            .get(server_name)
            .and_then(|id| state.servers.get(id))
            .cloned();
        Ok(server)
    }

    async fn list_servers(&self) -> FleetRepositoryResult<Vec<Server>> {
        let state = self.read()?;
        Ok(state.servers.values().cloned().collect())
    }

    async fn delete_server(&self, server_id: ServerId) -> FleetRepositoryResult<bool> {
        let mut state = self.write()?;

        let Some(server) = state.servers.remove(&server_id) else {
            return Ok(false);
        };

        state.server_names.remove(server.name());
        state
            .bindings
            .retain(|(bound_server, _), _| *bound_server != server_id);
        state
            .deploy_keys
            .retain(|_, deploy_key| deploy_key.server_id() != server_id);
        state
            .apps
            .retain(|(owning_server, _), _| *owning_server != server_id);
        Ok(true)
    }

    async fn register_service(&self, service: &Service) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        if state.service_names.contains_key(service.name()) {
            return Err(FleetRepositoryError::DuplicateServiceName(
                service.name().clone(),
            ));
        }

        state
            .service_names
            .insert(service.name().clone(), service.id());
        state.services.insert(service.id(), service.clone());
        Ok(())
    }

    async fn find_service(&self, service_id: ServiceId) -> FleetRepositoryResult<Option<Service>> {
        let state = self.read()?;
        Ok(state.services.get(&service_id).cloned())
    }

    async fn find_service_by_name(
        &self,
        service_name: &ServiceName,
    ) -> FleetRepositoryResult<Option<Service>> {
        let state = self.read()?;
        let service = state
            .service_names
            .get(service_name)
            .and_then(|id| state.services.get(id))
            .cloned();
        Ok(service)
    }

    async fn list_services(&self) -> FleetRepositoryResult<Vec<Service>> {
        let state = self.read()?;
        Ok(state.services.values().cloned().collect())
    }

    async fn remove_service(&self, service_id: ServiceId) -> FleetRepositoryResult<bool> {
        let mut state = self.write()?;

        let Some(service) = state.services.remove(&service_id) else {
            return Ok(false);
        };

        state.service_names.remove(service.name());
        state
            .bindings
            .retain(|(_, bound_service), _| *bound_service != service_id);
        Ok(true)
    }

    async fn attach_service(
        &self,
        binding: &ServiceBinding,
    ) -> FleetRepositoryResult<ServiceBinding> {
        let mut state = self.write()?;

        state.ensure_server(binding.server_id())?;
        if !state.services.contains_key(&binding.service_id()) {
            return Err(FleetRepositoryError::ServiceNotFound(binding.service_id()));
        }

        let live = state
            .bindings
            .entry((binding.server_id(), binding.service_id()))
            .or_insert_with(|| binding.clone());
        Ok(live.clone())
    }

    async fn find_binding(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<Option<ServiceBinding>> {
        let state = self.read()?;
        Ok(state.bindings.get(&(server_id, service_id)).cloned())
    }

    async fn update_binding(
        &self,
        binding: &ServiceBinding,
        expected: BindingStatus,
    ) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        let key = (binding.server_id(), binding.service_id());
        let stored =
            state
                .bindings
                .get_mut(&key)
                .ok_or(FleetRepositoryError::BindingNotFound {
                    server_id: binding.server_id(),
                    service_id: binding.service_id(),
                })?;
        if stored.status() != expected || stored.created_at() != binding.created_at() {
            return Err(FleetRepositoryError::BindingConflict {
                server_id: binding.server_id(),
                service_id: binding.service_id(),
            });
        }
        *stored = binding.clone();
        Ok(())
    }

    async fn detach_service(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state.bindings.remove(&(server_id, service_id)).is_some())
    }

    async fn list_bindings(
        &self,
        server_id: ServerId,
    ) -> FleetRepositoryResult<Vec<ServiceBinding>> {
        let state = self.read()?;
        let bindings = state
            .bindings
            .values()
            .filter(|binding| binding.server_id() == server_id)
            .cloned()
            .collect();
        Ok(bindings)
    }

    async fn add_deploy_key(&self, deploy_key: &DeployKey) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        state.ensure_server(deploy_key.server_id())?;
        let duplicate = state.deploy_keys.values().any(|existing| {
            existing.server_id() == deploy_key.server_id()
                && existing.fingerprint() == deploy_key.fingerprint()
        });
        if duplicate {
            return Err(FleetRepositoryError::DuplicateDeployKey {
                server_id: deploy_key.server_id(),
                fingerprint: deploy_key.fingerprint().to_owned(),
            });
        }

        state.deploy_keys.insert(deploy_key.id(), deploy_key.clone());
        Ok(())
    }

    async fn remove_deploy_key(&self, deploy_key_id: DeployKeyId) -> FleetRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state.deploy_keys.remove(&deploy_key_id).is_some())
    }

    async fn list_deploy_keys(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<DeployKey>> {
        let state = self.read()?;
        let mut keys: Vec<DeployKey> = state
            .deploy_keys
            .values()
            .filter(|deploy_key| deploy_key.server_id() == server_id)
            .cloned()
            .collect();
        keys.sort_by_key(DeployKey::created_at);
        Ok(keys)
    }

    async fn add_app(&self, app: &App) -> FleetRepositoryResult<()> {
        let mut state = self.write()?;

        state.ensure_server(app.server_id())?;
        let key = (app.server_id(), app.name().clone());
        if state.apps.contains_key(&key) {
            return Err(FleetRepositoryError::DuplicateAppName {
                server_id: app.server_id(),
                name: app.name().clone(),
            });
        }

        state.apps.insert(key, app.clone());
        Ok(())
    }

    async fn list_apps(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<App>> {
        let state = self.read()?;
        let apps = state
            .apps
            .values()
            .filter(|app| app.server_id() == server_id)
            .cloned()
            .collect();
        Ok(apps)
    }
}
