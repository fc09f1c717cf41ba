//! Shared test helpers for in-memory fleet integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use quayside::fleet::{
    adapters::memory::{InMemoryFleetRepository, InMemoryKeyProvisioner},
    domain::{Server, Service},
    services::{
        CreateServerRequest, ServerProvisioningService, ServerProvisioningServiceError,
        ServiceBindingService, ServiceBindingServiceError,
    },
};
use rstest::fixture;

/// Provisioning service wired to in-memory adapters.
pub type TestProvisioning =
    ServerProvisioningService<InMemoryFleetRepository, InMemoryKeyProvisioner, DefaultClock>;

/// Binding service wired to the in-memory repository.
pub type TestBindings = ServiceBindingService<InMemoryFleetRepository, DefaultClock>;

/// Services sharing one in-memory repository.
pub struct Fleet {
    /// Shared repository.
    pub repository: Arc<InMemoryFleetRepository>,
    /// Shared key provisioner.
    pub keys: Arc<InMemoryKeyProvisioner>,
    /// Server provisioning service.
    pub provisioning: TestProvisioning,
    /// Catalogue and binding service.
    pub bindings: TestBindings,
}

/// Provides a fresh fleet for each test.
#[fixture]
pub fn fleet() -> Fleet {
    let repository = Arc::new(InMemoryFleetRepository::new());
    let keys = Arc::new(InMemoryKeyProvisioner::new());
    let clock = Arc::new(DefaultClock);
    Fleet {
        provisioning: ServerProvisioningService::new(
            Arc::clone(&repository),
            Arc::clone(&keys),
            Arc::clone(&clock),
        ),
        bindings: ServiceBindingService::new(Arc::clone(&repository), clock),
        repository,
        keys,
    }
}

/// Creates a server with a fixed address.
///
/// # Errors
///
/// Returns the provisioning error when creation fails.
pub async fn create_server(
    fleet: &Fleet,
    name: &str,
) -> Result<Server, ServerProvisioningServiceError> {
    fleet
        .provisioning
        .create_server(CreateServerRequest::new(name, "192.0.2.10"))
        .await
}

/// Registers a catalogue service.
///
/// # Errors
///
/// Returns the binding service error when registration fails.
pub async fn register_service(
    fleet: &Fleet,
    name: &str,
) -> Result<Service, ServiceBindingServiceError> {
    fleet.bindings.register_service(name).await
}
