//! In-memory integration tests for server provisioning and owned records.

use super::helpers::{Fleet, create_server, fleet};
use quayside::fleet::{
    domain::RawStatus,
    ports::FleetRepositoryError,
    services::{CreateServerRequest, ServerProvisioningServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_server_can_be_found_by_id_and_name(fleet: Fleet) {
    let created = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");

    let by_id = fleet
        .provisioning
        .find_by_id(created.id())
        .await
        .expect("lookup should succeed");
    let by_name = fleet
        .provisioning
        .find_by_name("  web-1 ")
        .await
        .expect("lookup should succeed");

    assert_eq!(by_id.as_ref(), Some(&created));
    assert_eq!(by_name, Some(created));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_server_gets_distinct_keys(fleet: Fleet) {
    let first = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let second = create_server(&fleet, "web-2")
        .await
        .expect("server creation should succeed");

    assert_ne!(first.keypair(), second.keypair());
    assert_eq!(fleet.keys.issued(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_server_reports_setup_not_finished(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");

    assert_eq!(server.raw_status(), &RawStatus::Unset);
    assert_eq!(server.formatted_status(), "setup_not_finished");
    assert_eq!(server.runtime_version(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlong_address_is_rejected(fleet: Fleet) {
    let address = format!("{}.example.com", "a".repeat(250));

    let result = fleet
        .provisioning
        .create_server(CreateServerRequest::new("web-1", address))
        .await;

    assert!(matches!(result, Err(ServerProvisioningServiceError::Domain(_))));
    assert_eq!(fleet.keys.issued(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn runtime_version_round_trips_and_blank_clears(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");

    let updated = fleet
        .provisioning
        .record_runtime_version(server.id(), Some(" 0.4.10 ".to_owned()))
        .await
        .expect("version write should succeed");
    assert_eq!(updated.runtime_version(), Some("0.4.10"));

    let cleared = fleet
        .provisioning
        .record_runtime_version(server.id(), Some("   ".to_owned()))
        .await
        .expect("version write should succeed");
    assert_eq!(cleared.runtime_version(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_deploy_key_is_rejected(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    fleet
        .provisioning
        .add_deploy_key(server.id(), "ssh-ed25519 AAAAC3Nza ci", None)
        .await
        .expect("first deploy key should be added");

    let result = fleet
        .provisioning
        .add_deploy_key(server.id(), "  ssh-ed25519 AAAAC3Nza ci ", Some("again".to_owned()))
        .await;

    assert!(matches!(
        result,
        Err(ServerProvisioningServiceError::Repository(
            FleetRepositoryError::DuplicateDeployKey { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_deploy_key_may_serve_two_servers(fleet: Fleet) {
    let first = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let second = create_server(&fleet, "web-2")
        .await
        .expect("server creation should succeed");

    for server in [&first, &second] {
        fleet
            .provisioning
            .add_deploy_key(server.id(), "ssh-ed25519 AAAAC3Nza ci", None)
            .await
            .expect("deploy key should be added");
    }

    let keys = fleet
        .provisioning
        .list_deploy_keys(second.id())
        .await
        .expect("listing should succeed");
    assert_eq!(keys.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removed_deploy_key_leaves_credentials(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    let deploy_key = fleet
        .provisioning
        .add_deploy_key(server.id(), "ssh-rsa AAAAB3Nza laptop", None)
        .await
        .expect("deploy key should be added");

    let removed = fleet
        .provisioning
        .remove_deploy_key(deploy_key.id())
        .await
        .expect("removal should succeed");
    let credentials = fleet
        .provisioning
        .access_credentials(server.id())
        .await
        .expect("credentials should load");

    assert!(removed);
    assert!(credentials.deploy_keys().is_empty());
    assert_eq!(
        credentials
            .render_authorized_keys()
            .expect("rendering should succeed"),
        "# deploy keys for web-1\n"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn app_names_are_unique_per_server(fleet: Fleet) {
    let server = create_server(&fleet, "web-1")
        .await
        .expect("server creation should succeed");
    fleet
        .provisioning
        .add_app(server.id(), "blog")
        .await
        .expect("first app should be added");

    let result = fleet.provisioning.add_app(server.id(), "Blog").await;

    assert!(matches!(
        result,
        Err(ServerProvisioningServiceError::Repository(
            FleetRepositoryError::DuplicateAppName { .. }
        ))
    ));
    let apps = fleet
        .provisioning
        .list_apps(server.id())
        .await
        .expect("listing should succeed");
    assert_eq!(apps.len(), 1);
}
