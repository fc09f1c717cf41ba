//! In-memory integration tests for cascading removal and concurrent access.

use std::sync::Arc;

use super::helpers::{Fleet, create_server, fleet, register_service};
use mockable::DefaultClock;
use quayside::fleet::{
    ports::FleetRepository,
    services::{ServerProvisioningService, ServiceBindingService},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_server_removes_owned_records(fleet: Fleet) {
    let doomed = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let survivor = create_server(&fleet, "web-2")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    for server in [&doomed, &survivor] {
        fleet
            .bindings
            .attach(server.id(), redis.id())
            .await
            .expect("attach should succeed");
        fleet
            .provisioning
            .add_app(server.id(), "blog")
            .await
            .expect("app should be added");
        fleet
            .provisioning
            .add_deploy_key(server.id(), "ssh-ed25519 AAAAC3Nza ci", None)
            .await
            .expect("deploy key should be added");
    }

    let deleted = fleet
        .provisioning
        .delete_server(doomed.id())
        .await
        .expect("deletion should succeed");

    assert!(deleted);
    let repository = &fleet.repository;
    assert!(
        repository
            .list_bindings(doomed.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert!(
        repository
            .list_apps(doomed.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert!(
        repository
            .list_deploy_keys(doomed.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert_eq!(
        repository
            .list_bindings(survivor.id())
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
    assert!(
        fleet
            .bindings
            .find_service_by_name("redis")
            .await
            .expect("lookup should succeed")
            .is_some()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_missing_server_returns_false(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    fleet
        .provisioning
        .delete_server(server.id())
        .await
        .expect("deletion should succeed");

    let deleted_again = fleet
        .provisioning
        .delete_server(server.id())
        .await
        .expect("deletion should succeed");

    assert!(!deleted_again);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removing_service_unbinds_it_everywhere(fleet: Fleet) {
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

    let removed = fleet
        .bindings
        .remove_service(redis.id())
        .await
        .expect("removal should succeed");

    assert!(removed);
    assert!(
        !fleet
            .bindings
            .has_service(server.id(), redis.id())
            .await
            .expect("lookup should succeed")
    );
    assert!(
        fleet
            .bindings
            .list_services()
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_attach_creates_one_binding(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    let bindings = Arc::new(ServiceBindingService::new(
        Arc::clone(&fleet.repository),
        Arc::new(DefaultClock),
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&bindings);
            let server_id = server.id();
            let service_id = redis.id();
            tokio::spawn(async move { service.attach(server_id, service_id).await })
        })
        .collect();

    let mut created_at = Vec::new();
    for handle in handles {
        let binding = handle
            .await
            .expect("task should join")
            .expect("attach should succeed");
        created_at.push(binding.created_at());
    }

    created_at.dedup();
    assert_eq!(created_at.len(), 1);
    assert_eq!(
        fleet
            .bindings
            .list_bindings(server.id())
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attach_racing_delete_leaves_no_orphans(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let redis = register_service(&fleet, "redis")
        .await
        .expect("service registration should succeed");
    let bindings = Arc::new(ServiceBindingService::new(
        Arc::clone(&fleet.repository),
        Arc::new(DefaultClock),
    ));
    let provisioning = Arc::new(ServerProvisioningService::new(
        Arc::clone(&fleet.repository),
        Arc::clone(&fleet.keys),
        Arc::new(DefaultClock),
    ));

    let attach = {
        let service = Arc::clone(&bindings);
        let server_id = server.id();
        let service_id = redis.id();
        tokio::spawn(async move { service.attach(server_id, service_id).await })
    };
    let delete = {
        let service = Arc::clone(&provisioning);
        let server_id = server.id();
        tokio::spawn(async move { service.delete_server(server_id).await })
    };

    let _attach_result = attach.await.expect("task should join");
    let deleted = delete
        .await
        .expect("task should join")
        .expect("deletion should succeed");

    assert!(deleted);
    assert!(
        fleet
            .repository
            .list_bindings(server.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}
