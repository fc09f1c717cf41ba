//! Given steps for service binding BDD scenarios.

use super::world::{FleetWorld, run_async};
use eyre::WrapErr;
use quayside::fleet::services::CreateServerRequest;
use rstest_bdd_macros::given;

#[given(r#"a server named "{name}""#)]
fn a_server_named(world: &mut FleetWorld, name: String) -> Result<(), eyre::Report> {
    let request = CreateServerRequest::new(name.as_str(), "192.0.2.10");
    let server = run_async(world.provisioning.create_server(request))
        .wrap_err("create server for scenario")?;
    world.servers.insert(name, server.id());
    Ok(())
}

#[given(r#"a catalogue service named "{name}""#)]
fn a_catalogue_service_named(world: &mut FleetWorld, name: String) -> Result<(), eyre::Report> {
    let service = run_async(world.bindings.register_service(&name))
        .wrap_err("register catalogue service for scenario")?;
    world.services.insert(name, service.id());
    Ok(())
}

#[given(r#""{service}" is attached to "{server}""#)]
fn service_is_attached(
    world: &mut FleetWorld,
    service: String,
    server: String,
) -> Result<(), eyre::Report> {
    let server_id = world.server_id(&server)?;
    let service_id = world.service_id(&service)?;
    run_async(world.bindings.attach(server_id, service_id))
        .wrap_err("attach service for scenario")?;
    Ok(())
}
