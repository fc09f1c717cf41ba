//! In-memory integration tests for service bindings and installer writes.

use std::sync::{Arc, Mutex};

use super::helpers::{Fleet, create_server, fleet, register_service};
use async_trait::async_trait;
use mockable::DefaultClock;
use quayside::fleet::{
    adapters::memory::InMemoryFleetRepository,
    domain::{
        App, BindingStatus, DeployKey, DeployKeyId, FleetDomainError, Server, ServerId,
        ServerName, Service, ServiceBinding, ServiceId, ServiceName, ServiceStatus,
    },
    ports::{FleetRepository, FleetRepositoryError, FleetRepositoryResult},
    services::{ServiceBindingService, ServiceBindingServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn installer_drives_binding_to_installed(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    fleet
        .bindings
        .attach(server.id(), redis.id())
        .await
        .expect("attach should succeed");

    for (written, rendered) in [
        (BindingStatus::Installing, "installing"),
        (BindingStatus::Installed, "installed"),
    ] {
        fleet
            .bindings
            .record_status(server.id(), redis.id(), written)
            .await
            .expect("status write should succeed");
        let status = fleet
            .bindings
            .service_status(server.id(), redis.id())
            .await
            .expect("lookup should succeed");
        assert_eq!(status.as_str(), rendered);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_install_can_be_retried(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let postgres = register_service(&fleet, "postgres")
        .await
        .expect("service registration should succeed");
    fleet
        .bindings
        .attach(server.id(), postgres.id())
        .await
        .expect("attach should succeed");

    for status in [
        BindingStatus::Installing,
        BindingStatus::Failed,
        BindingStatus::Installing,
        BindingStatus::Installed,
    ] {
        fleet
            .bindings
            .record_status(server.id(), postgres.id(), status)
            .await
            .expect("status write should succeed");
    }

    let binding = fleet
        .bindings
        .binding(server.id(), postgres.id())
        .await
        .expect("lookup should succeed")
        .expect("binding should exist");
    assert_eq!(binding.status(), BindingStatus::Installed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unbound_service_reads_as_new(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");

    let status = fleet
        .bindings
        .service_status(server.id(), redis.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(status, ServiceStatus::Absent);
    assert_eq!(status.to_string(), "new");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detach_removes_only_that_binding(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    let postgres = register_service(&fleet, "postgres")
        .await
        .expect("service registration should succeed");
    for service in [&redis, &postgres] {
        fleet
            .bindings
            .attach(server.id(), service.id())
            .await
            .expect("attach should succeed");
    }

    let removed = fleet
        .bindings
        .detach(server.id(), redis.id())
        .await
        .expect("detach should succeed");
    let removed_again = fleet
        .bindings
        .detach(server.id(), redis.id())
        .await
        .expect("detach should succeed");

    assert!(removed);
    assert!(!removed_again);
    let remaining = fleet
        .bindings
        .list_bindings(server.id())
        .await
        .expect("listing should succeed");
    assert_eq!(remaining.len(), 1);
    assert!(
        fleet
            .bindings
            .has_service(server.id(), postgres.id())
            .await
            .expect("lookup should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_service_name_is_rejected(fleet: Fleet) {
    register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");

    let result = register_service(&fleet, " REDIS ").await;

    assert!(matches!(
        result,
        Err(ServiceBindingServiceError::Repository(
            FleetRepositoryError::DuplicateServiceName(_)
        ))
    ));
    let found = fleet
        .bindings
        .find_service_by_name("redis")
        .await
        .expect("lookup should succeed");
    assert!(found.is_some());
}

/// A write another party commits right after a binding has been read.
#[derive(Debug, Clone, Copy)]
enum Interleaved {
    Reattach,
    Record(BindingStatus),
}

/// Repository that commits an [`Interleaved`] write after the next binding
/// lookup, so the caller acts on a snapshot that is already stale.
struct InterleavingRepository {
    inner: Arc<InMemoryFleetRepository>,
    pending: Mutex<Option<Interleaved>>,
}

impl InterleavingRepository {
    fn new(inner: Arc<InMemoryFleetRepository>, write: Interleaved) -> Self {
        Self {
            inner,
            pending: Mutex::new(Some(write)),
        }
    }

    async fn commit(
        &self,
        write: Interleaved,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<()> {
        let clock = DefaultClock;
        match write {
            Interleaved::Reattach => {
                self.inner.detach_service(server_id, service_id).await?;
                self.inner
                    .attach_service(&ServiceBinding::new(server_id, service_id, &clock))
                    .await?;
            }
            Interleaved::Record(status) => {
                let mut binding = self
                    .inner
                    .find_binding(server_id, service_id)
                    .await?
                    .expect("binding should exist");
                let previous = binding.status();
                binding
                    .transition_to(status, &clock)
                    .expect("interleaved transition should be allowed");
                self.inner.update_binding(&binding, previous).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FleetRepository for InterleavingRepository {
    async fn create_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        self.inner.create_server(server).await
    }

    async fn update_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        self.inner.update_server(server).await
    }

    async fn find_server(&self, server_id: ServerId) -> FleetRepositoryResult<Option<Server>> {
        self.inner.find_server(server_id).await
    }

    async fn find_server_by_name(
        &self,
        server_name: &ServerName,
    ) -> FleetRepositoryResult<Option<Server>> {
        self.inner.find_server_by_name(server_name).await
    }

    async fn list_servers(&self) -> FleetRepositoryResult<Vec<Server>> {
        self.inner.list_servers().await
    }

    async fn delete_server(&self, server_id: ServerId) -> FleetRepositoryResult<bool> {
        self.inner.delete_server(server_id).await
    }

    async fn register_service(&self, service: &Service) -> FleetRepositoryResult<()> {
        self.inner.register_service(service).await
    }

    async fn find_service(&self, service_id: ServiceId) -> FleetRepositoryResult<Option<Service>> {
        self.inner.find_service(service_id).await
    }

    async fn find_service_by_name(
        &self,
        service_name: &ServiceName,
    ) -> FleetRepositoryResult<Option<Service>> {
        self.inner.find_service_by_name(service_name).await
    }

    async fn list_services(&self) -> FleetRepositoryResult<Vec<Service>> {
        self.inner.list_services().await
    }

    async fn remove_service(&self, service_id: ServiceId) -> FleetRepositoryResult<bool> {
        self.inner.remove_service(service_id).await
    }

    async fn attach_service(
        &self,
        binding: &ServiceBinding,
    ) -> FleetRepositoryResult<ServiceBinding> {
        self.inner.attach_service(binding).await
    }

    async fn find_binding(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<Option<ServiceBinding>> {
        let snapshot = self.inner.find_binding(server_id, service_id).await?;
        let pending = self.pending.lock().expect("pending lock").take();
        if let Some(write) = pending {
            self.commit(write, server_id, service_id).await?;
        }
        Ok(snapshot)
    }

    async fn update_binding(
        &self,
        binding: &ServiceBinding,
        expected: BindingStatus,
    ) -> FleetRepositoryResult<()> {
        self.inner.update_binding(binding, expected).await
    }

    async fn detach_service(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<bool> {
        self.inner.detach_service(server_id, service_id).await
    }

    async fn list_bindings(
        &self,
        server_id: ServerId,
    ) -> FleetRepositoryResult<Vec<ServiceBinding>> {
        self.inner.list_bindings(server_id).await
    }

    async fn add_deploy_key(&self, deploy_key: &DeployKey) -> FleetRepositoryResult<()> {
        self.inner.add_deploy_key(deploy_key).await
    }

    async fn remove_deploy_key(&self, deploy_key_id: DeployKeyId) -> FleetRepositoryResult<bool> {
        self.inner.remove_deploy_key(deploy_key_id).await
    }

    async fn list_deploy_keys(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<DeployKey>> {
        self.inner.list_deploy_keys(server_id).await
    }

    async fn add_app(&self, app: &App) -> FleetRepositoryResult<()> {
        self.inner.add_app(app).await
    }

    async fn list_apps(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<App>> {
        self.inner.list_apps(server_id).await
    }
}

/// Binds `redis` to `web-1`, moves it to `start`, and returns a binding
/// service whose next lookup lets `write` slip in.
async fn contended_binding(
    fleet: &Fleet,
    start: BindingStatus,
    write: Interleaved,
) -> (
    ServiceBindingService<InterleavingRepository, DefaultClock>,
    ServerId,
    ServiceId,
) {
    let server = create_server(fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(fleet, "redis")
        .await
        .expect("service registration should succeed");
    fleet
        .bindings
        .attach(server.id(), redis.id())
        .await
        .expect("attach should succeed");
    if start != BindingStatus::New {
        fleet
            .bindings
            .record_status(server.id(), redis.id(), start)
            .await
            .expect("status write should succeed");
    }

    let contended = ServiceBindingService::new(
        Arc::new(InterleavingRepository::new(
            Arc::clone(&fleet.repository),
            write,
        )),
        Arc::new(DefaultClock),
    );
    (contended, server.id(), redis.id())
}

#[rstest]
#[case::reattached(Interleaved::Reattach, BindingStatus::New)]
#[case::failed_first(Interleaved::Record(BindingStatus::Failed), BindingStatus::Failed)]
#[tokio::test(flavor = "multi_thread")]
async fn stale_installer_write_is_revalidated(
    fleet: Fleet,
    #[case] interleaved: Interleaved,
    #[case] surviving: BindingStatus,
) {
    let (contended, server_id, service_id) =
        contended_binding(&fleet, BindingStatus::Installing, interleaved).await;

    let result = contended
        .record_status(server_id, service_id, BindingStatus::Installed)
        .await;

    assert!(matches!(
        result,
        Err(ServiceBindingServiceError::Domain(
            FleetDomainError::InvalidBindingTransition { .. }
        ))
    ));
    let status = fleet
        .bindings
        .service_status(server_id, service_id)
        .await
        .expect("lookup should succeed");
    assert_eq!(status, ServiceStatus::Bound(surviving));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_identical_write_settles_once(fleet: Fleet) {
    let (contended, server_id, service_id) = contended_binding(
        &fleet,
        BindingStatus::New,
        Interleaved::Record(BindingStatus::Installing),
    )
    .await;

    let binding = contended
        .record_status(server_id, service_id, BindingStatus::Installing)
        .await
        .expect("retried write should succeed");

    assert_eq!(binding.status(), BindingStatus::Installing);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_snapshot_is_refused_by_repository(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    let mut stale = fleet
        .bindings
        .attach(server.id(), redis.id())
        .await
        .expect("attach should succeed");
    fleet
        .bindings
        .record_status(server.id(), redis.id(), BindingStatus::Installing)
        .await
        .expect("status write should succeed");

    stale
        .transition_to(BindingStatus::Installing, &DefaultClock)
        .expect("transition should be allowed");
    let result = fleet
        .repository
        .update_binding(&stale, BindingStatus::New)
        .await;

    assert!(matches!(
        result,
        Err(FleetRepositoryError::BindingConflict { .. })
    ));
}
