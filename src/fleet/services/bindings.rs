//! Service catalogue and per-server service binding orchestration.

use crate::fleet::{
    domain::{
        BindingStatus, FleetDomainError, ServerId, Service, ServiceBinding, ServiceId,
        ServiceName, ServiceStatus,
    },
    ports::{FleetRepository, FleetRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for catalogue and binding operations.
#[derive(Debug, Error)]
pub enum ServiceBindingServiceError {
    /// Domain validation or transition check failed.
    #[error(transparent)]
    Domain(#[from] FleetDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] FleetRepositoryError),
    /// The service is not attached to the server.
    #[error("service {service_id} is not attached to server {server_id}")]
    NotAttached {
        /// Server identifier.
        server_id: ServerId,
        /// Service identifier.
        service_id: ServiceId,
    },
}

/// Compare-and-set attempts before a contended status write gives up.
const STATUS_WRITE_ATTEMPTS: usize = 8;

/// Result type for binding service operations.
pub type ServiceBindingServiceResult<T> = Result<T, ServiceBindingServiceError>;

/// Manages the service catalogue and which services are bound to which
/// servers.
///
/// Attaching never installs anything: a fresh binding stays `new` until the
/// external installer reports progress through
/// [`ServiceBindingService::record_status`].
#[derive(Clone)]
pub struct ServiceBindingService<R, C>
where
    R: FleetRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ServiceBindingService<R, C>
where
    R: FleetRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new binding service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Adds a service to the catalogue.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid name and
    /// [`FleetRepositoryError::DuplicateServiceName`] when it is taken.
    pub async fn register_service(&self, name: &str) -> ServiceBindingServiceResult<Service> {
        let service = Service::new(ServiceName::new(name)?, &*self.clock);
        self.repository.register_service(&service).await?;
        info!(service_id = %service.id(), service = %service.name(), "service registered");
        Ok(service)
    }

    /// Finds a catalogue service by name.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid name and persistence errors.
    pub async fn find_service_by_name(
        &self,
        name: &str,
    ) -> ServiceBindingServiceResult<Option<Service>> {
        let validated_name = ServiceName::new(name)?;
        Ok(self.repository.find_service_by_name(&validated_name).await?)
    }

    /// Lists the whole catalogue.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_services(&self) -> ServiceBindingServiceResult<Vec<Service>> {
        Ok(self.repository.list_services().await?)
    }

    /// Removes a service from the catalogue and every binding to it.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn remove_service(&self, service_id: ServiceId) -> ServiceBindingServiceResult<bool> {
        let removed = self.repository.remove_service(service_id).await?;
        if removed {
            info!(service_id = %service_id, "service removed");
        }
        Ok(removed)
    }

    /// Binds a service to a server in state `new`.
    ///
    /// Re-attaching an already bound pair returns the existing binding
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FleetRepositoryError::ServerNotFound`] or
    /// [`FleetRepositoryError::ServiceNotFound`] when either side is missing.
    pub async fn attach(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> ServiceBindingServiceResult<ServiceBinding> {
        let candidate = ServiceBinding::new(server_id, service_id, &*self.clock);
        let live = self.repository.attach_service(&candidate).await?;
        debug!(
            server_id = %server_id,
            service_id = %service_id,
            status = %live.status(),
            "service attached"
        );
        Ok(live)
    }

    /// Unbinds a service from a server. Returns `false` when it was not bound.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn detach(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> ServiceBindingServiceResult<bool> {
        let removed = self.repository.detach_service(server_id, service_id).await?;
        debug!(server_id = %server_id, service_id = %service_id, removed, "service detached");
        Ok(removed)
    }

    /// Returns whether the service is bound to the server.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn has_service(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> ServiceBindingServiceResult<bool> {
        Ok(self.binding(server_id, service_id).await?.is_some())
    }

    /// Returns the installation status of the service on the server.
    ///
    /// An unbound pair yields [`ServiceStatus::Absent`], which renders as
    /// `new`.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn service_status(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> ServiceBindingServiceResult<ServiceStatus> {
        let binding = self.binding(server_id, service_id).await?;
        Ok(ServiceStatus::from(binding.map(|found| found.status())))
    }

    /// Returns the binding for the pair, if any.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn binding(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> ServiceBindingServiceResult<Option<ServiceBinding>> {
        Ok(self.repository.find_binding(server_id, service_id).await?)
    }

    /// Lists the bindings owned by a server.
    ///
    /// # Errors
    ///
    /// Returns persistence errors from the repository.
    pub async fn list_bindings(
        &self,
        server_id: ServerId,
    ) -> ServiceBindingServiceResult<Vec<ServiceBinding>> {
        Ok(self.repository.list_bindings(server_id).await?)
    }

    /// Applies a status reported by the external installer.
    ///
    /// Rewriting the current status is a no-op. The write is a
    /// compare-and-set against the binding that was read; when another writer
    /// got there first the new status is re-validated against the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceBindingServiceError::NotAttached`] when the pair is not
    /// bound, [`FleetDomainError::InvalidBindingTransition`] for a disallowed
    /// transition, [`FleetRepositoryError::BindingConflict`] when contention
    /// outlasts every retry, or persistence errors.
    pub async fn record_status(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
        status: BindingStatus,
    ) -> ServiceBindingServiceResult<ServiceBinding> {
        for _attempt in 0..STATUS_WRITE_ATTEMPTS {
            let snapshot = self.binding(server_id, service_id).await?.ok_or(
                ServiceBindingServiceError::NotAttached {
                    server_id,
                    service_id,
                },
            )?;
            if let Some(written) = self.write_status(snapshot, status).await? {
                return Ok(written);
            }
            debug!(
                server_id = %server_id,
                service_id = %service_id,
                to = %status,
                "binding changed during status write, retrying"
            );
        }
        Err(FleetRepositoryError::BindingConflict {
            server_id,
            service_id,
        }
        .into())
    }

    /// Returns `None` when the stored binding no longer matches `binding`.
    async fn write_status(
        &self,
        mut binding: ServiceBinding,
        status: BindingStatus,
    ) -> ServiceBindingServiceResult<Option<ServiceBinding>> {
        let server_id = binding.server_id();
        let service_id = binding.service_id();
        let previous = binding.status();

        let changed = binding
            .transition_to(status, &*self.clock)
            .inspect_err(|err| {
                warn!(
                    server_id = %server_id,
                    service_id = %service_id,
                    from = %previous,
                    to = %status,
                    error = %err,
                    "binding status write rejected"
                );
            })?;
        if !changed {
            return Ok(Some(binding));
        }

        match self.repository.update_binding(&binding, previous).await {
            Ok(()) => {
                debug!(
                    server_id = %server_id,
                    service_id = %service_id,
                    from = %previous,
                    to = %status,
                    "binding status recorded"
                );
                Ok(Some(binding))
            }
            Err(FleetRepositoryError::BindingConflict { .. }) => Ok(None),
            Err(FleetRepositoryError::BindingNotFound {
                server_id: missing_server,
                service_id: missing_service,
            }) => Err(ServiceBindingServiceError::NotAttached {
                server_id: missing_server,
                service_id: missing_service,
            }),
            Err(other) => Err(other.into()),
        }
    }
}
