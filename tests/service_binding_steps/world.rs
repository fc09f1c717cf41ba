//! Shared world state for service binding BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use quayside::fleet::{
    adapters::memory::{InMemoryFleetRepository, InMemoryKeyProvisioner},
    domain::{ServerId, ServiceBinding, ServiceId},
    services::{ServerProvisioningService, ServiceBindingService, ServiceBindingServiceError},
};
use rstest::fixture;

/// Scenario world for service binding behaviour tests.
pub struct FleetWorld {
    /// Repository shared by both services.
    pub repository: Arc<InMemoryFleetRepository>,
    /// Server provisioning service.
    pub provisioning:
        ServerProvisioningService<InMemoryFleetRepository, InMemoryKeyProvisioner, DefaultClock>,
    /// Catalogue and binding service.
    pub bindings: ServiceBindingService<InMemoryFleetRepository, DefaultClock>,
    /// Servers created in the scenario, by name.
    pub servers: HashMap<String, ServerId>,
    /// Catalogue services registered in the scenario, by name.
    pub services: HashMap<String, ServiceId>,
    /// Result of the last installer status write.
    pub last_status_write: Option<Result<ServiceBinding, ServiceBindingServiceError>>,
    /// Identifier of the last deleted server.
    pub deleted_server: Option<ServerId>,
}

impl FleetWorld {
    /// Creates a world with an empty fleet.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryFleetRepository::new());
        let clock = Arc::new(DefaultClock);
        Self {
            provisioning: ServerProvisioningService::new(
                Arc::clone(&repository),
                Arc::new(InMemoryKeyProvisioner::new()),
                Arc::clone(&clock),
            ),
            bindings: ServiceBindingService::new(Arc::clone(&repository), clock),
            repository,
            servers: HashMap::new(),
            services: HashMap::new(),
            last_status_write: None,
            deleted_server: None,
        }
    }

    /// Returns the identifier of a server created earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no server with that name was created.
    pub fn server_id(&self, name: &str) -> Result<ServerId, eyre::Report> {
        self.servers
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("no server named '{name}' in scenario world"))
    }

    /// Returns the identifier of a service registered earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no service with that name was registered.
    pub fn service_id(&self, name: &str) -> Result<ServiceId, eyre::Report> {
        self.services
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("no service named '{name}' in scenario world"))
    }
}

impl Default for FleetWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> FleetWorld {
    FleetWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
