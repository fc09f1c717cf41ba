//! `PostgreSQL` repository implementation for fleet records.

use super::{
    models::{AppRow, DeployKeyRow, ServerRow, ServiceBindingRow, ServiceRow},
    schema::{apps, deploy_keys, servers, service_bindings, services},
};
use crate::fleet::{
    domain::{
        App, AppId, AppName, BindingStatus, DeployKey, DeployKeyId, PersistedBindingData,
        PersistedDeployKeyData, PersistedServerData, RawStatus, Server, ServerAddress, ServerId,
        ServerKeypair, ServerName, Service, ServiceBinding, ServiceId, ServiceName,
    },
    ports::{FleetRepository, FleetRepositoryError, FleetRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for fleet adapters.
pub type FleetPgPool = Pool<ConnectionManager<PgConnection>>;

const SERVER_NAME_INDEX: &str = "idx_servers_name";
const SERVICE_NAME_INDEX: &str = "idx_services_name";
const DEPLOY_KEY_FINGERPRINT_INDEX: &str = "idx_deploy_keys_server_fingerprint";
const APP_NAME_INDEX: &str = "idx_apps_server_name";
const BINDING_SERVER_FK: &str = "fk_service_bindings_server";

/// `PostgreSQL`-backed repository for servers, services, and their bindings.
///
/// Binding uniqueness rests on the `(server_id, service_id)` primary key and
/// `ON CONFLICT DO NOTHING`; cascades rest on `ON DELETE CASCADE` foreign keys
/// plus an explicit transaction in [`FleetRepository::delete_server`].
#[derive(Debug, Clone)]
pub struct PostgresFleetRepository {
    pool: FleetPgPool,
}

impl PostgresFleetRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: FleetPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> FleetRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> FleetRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(FleetRepositoryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(FleetRepositoryError::persistence)?
    }
}

#[async_trait]
impl FleetRepository for PostgresFleetRepository {
    async fn create_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        let server_id = server.id();
        let server_name = server.name().clone();
        let row = server_to_row(server);

        self.run_blocking(move |connection| {
            diesel::insert_into(servers::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), SERVER_NAME_INDEX) =>
                    {
                        FleetRepositoryError::DuplicateServerName(server_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        FleetRepositoryError::DuplicateServer(server_id)
                    }
                    _ => FleetRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_server(&self, server: &Server) -> FleetRepositoryResult<()> {
        let server_id = server.id();
        let runtime_version = server.runtime_version().map(str::to_owned);
        let raw_status = server.raw_status().to_persisted();
        let updated_at = server.updated_at();

        self.run_blocking(move |connection| {
            let updated_count =
                diesel::update(servers::table.filter(servers::id.eq(server_id.into_inner())))
                    .set((
                        servers::runtime_version.eq(&runtime_version),
                        servers::raw_status.eq(&raw_status),
                        servers::updated_at.eq(updated_at),
                    ))
                    .execute(connection)
                    .map_err(FleetRepositoryError::persistence)?;

            if updated_count == 0 {
                return Err(FleetRepositoryError::ServerNotFound(server_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_server(&self, server_id: ServerId) -> FleetRepositoryResult<Option<Server>> {
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::id.eq(server_id.into_inner()))
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(FleetRepositoryError::persistence)?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn find_server_by_name(
        &self,
        server_name: &ServerName,
    ) -> FleetRepositoryResult<Option<Server>> {
        let name = server_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::name.eq(&name))
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(FleetRepositoryError::persistence)?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn list_servers(&self) -> FleetRepositoryResult<Vec<Server>> {
        self.run_blocking(move |connection| {
            let rows = servers::table
                .order(servers::created_at.asc())
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)
                .map_err(FleetRepositoryError::persistence)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }

    async fn delete_server(&self, server_id: ServerId) -> FleetRepositoryResult<bool> {
        let id = server_id.into_inner();
        self.run_blocking(move |connection| {
            connection.transaction::<_, FleetRepositoryError, _>(|tx| {
                diesel::delete(service_bindings::table.filter(service_bindings::server_id.eq(id)))
                    .execute(tx)?;
                diesel::delete(deploy_keys::table.filter(deploy_keys::server_id.eq(id)))
                    .execute(tx)?;
                diesel::delete(apps::table.filter(apps::server_id.eq(id))).execute(tx)?;
                let deleted = diesel::delete(servers::table.filter(servers::id.eq(id))).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn register_service(&self, service: &Service) -> FleetRepositoryResult<()> {
        let service_name = service.name().clone();
        let row = ServiceRow {
            id: service.id().into_inner(),
            name: service.name().as_str().to_owned(),
            created_at: service.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(services::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), SERVICE_NAME_INDEX) =>
                    {
                        FleetRepositoryError::DuplicateServiceName(service_name.clone())
                    }
                    _ => FleetRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_service(&self, service_id: ServiceId) -> FleetRepositoryResult<Option<Service>> {
        self.run_blocking(move |connection| {
            let row = services::table
                .filter(services::id.eq(service_id.into_inner()))
                .select(ServiceRow::as_select())
                .first::<ServiceRow>(connection)
                .optional()
                .map_err(FleetRepositoryError::persistence)?;
            row.map(row_to_service).transpose()
        })
        .await
    }

    async fn find_service_by_name(
        &self,
        service_name: &ServiceName,
    ) -> FleetRepositoryResult<Option<Service>> {
        let name = service_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = services::table
                .filter(services::name.eq(&name))
                .select(ServiceRow::as_select())
                .first::<ServiceRow>(connection)
                .optional()
                .map_err(FleetRepositoryError::persistence)?;
            row.map(row_to_service).transpose()
        })
        .await
    }

    async fn list_services(&self) -> FleetRepositoryResult<Vec<Service>> {
        self.run_blocking(move |connection| {
            let rows = services::table
                .order(services::name.asc())
                .select(ServiceRow::as_select())
                .load::<ServiceRow>(connection)
                .map_err(FleetRepositoryError::persistence)?;
            rows.into_iter().map(row_to_service).collect()
        })
        .await
    }

    async fn remove_service(&self, service_id: ServiceId) -> FleetRepositoryResult<bool> {
        let id = service_id.into_inner();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(services::table.filter(services::id.eq(id)))
                .execute(connection)
                .map_err(FleetRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn attach_service(
        &self,
        binding: &ServiceBinding,
    ) -> FleetRepositoryResult<ServiceBinding> {
        let server_id = binding.server_id();
        let service_id = binding.service_id();
        let row = binding_to_row(binding);

        self.run_blocking(move |connection| {
            connection.transaction::<_, FleetRepositoryError, _>(|tx| {
                diesel::insert_into(service_bindings::table)
                    .values(&row)
                    .on_conflict((service_bindings::server_id, service_bindings::service_id))
                    .do_nothing()
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
                            if violates(info.as_ref(), BINDING_SERVER_FK) =>
                        {
                            FleetRepositoryError::ServerNotFound(server_id)
                        }
                        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                            FleetRepositoryError::ServiceNotFound(service_id)
                        }
                        _ => FleetRepositoryError::persistence(err),
                    })?;

                let live = service_bindings::table
                    .find((server_id.into_inner(), service_id.into_inner()))
                    .select(ServiceBindingRow::as_select())
                    .first::<ServiceBindingRow>(tx)
                    .optional()?
                    .ok_or(FleetRepositoryError::ServerNotFound(server_id))?;
                row_to_binding(live)
            })
        })
        .await
    }

    async fn find_binding(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<Option<ServiceBinding>> {
        self.run_blocking(move |connection| {
            let row = service_bindings::table
                .find((server_id.into_inner(), service_id.into_inner()))
                .select(ServiceBindingRow::as_select())
                .first::<ServiceBindingRow>(connection)
                .optional()
                .map_err(FleetRepositoryError::persistence)?;
            row.map(row_to_binding).transpose()
        })
        .await
    }

    async fn update_binding(
        &self,
        binding: &ServiceBinding,
        expected: BindingStatus,
    ) -> FleetRepositoryResult<()> {
        let server_id = binding.server_id();
        let service_id = binding.service_id();
        let status = binding.status().as_str();
        let created_at = binding.created_at();
        let updated_at = binding.updated_at();

        self.run_blocking(move |connection| {
            connection.transaction::<_, FleetRepositoryError, _>(|tx| {
                let key = (server_id.into_inner(), service_id.into_inner());
                let updated_count = diesel::update(
                    service_bindings::table
                        .find(key)
                        .filter(service_bindings::status.eq(expected.as_str()))
                        .filter(service_bindings::created_at.eq(created_at)),
                )
                .set((
                    service_bindings::status.eq(status),
                    service_bindings::updated_at.eq(updated_at),
                ))
                .execute(tx)?;

                if updated_count > 0 {
                    return Ok(());
                }

                let still_bound = diesel::select(diesel::dsl::exists(
                    service_bindings::table.find(key),
                ))
                .get_result::<bool>(tx)?;
                if still_bound {
                    Err(FleetRepositoryError::BindingConflict {
                        server_id,
                        service_id,
                    })
                } else {
                    Err(FleetRepositoryError::BindingNotFound {
                        server_id,
                        service_id,
                    })
                }
            })
        })
        .await
    }

    async fn detach_service(
        &self,
        server_id: ServerId,
        service_id: ServiceId,
    ) -> FleetRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                service_bindings::table.find((server_id.into_inner(), service_id.into_inner())),
            )
            .execute(connection)
            .map_err(FleetRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_bindings(
        &self,
        server_id: ServerId,
    ) -> FleetRepositoryResult<Vec<ServiceBinding>> {
        self.run_blocking(move |connection| {
            let rows = service_bindings::table
                .filter(service_bindings::server_id.eq(server_id.into_inner()))
                .order(service_bindings::created_at.asc())
                .select(ServiceBindingRow::as_select())
                .load::<ServiceBindingRow>(connection)
                .map_err(FleetRepositoryError::persistence)?;
            rows.into_iter().map(row_to_binding).collect()
        })
        .await
    }

    async fn add_deploy_key(&self, deploy_key: &DeployKey) -> FleetRepositoryResult<()> {
        let server_id = deploy_key.server_id();
        let fingerprint = deploy_key.fingerprint().to_owned();
        let row = DeployKeyRow {
            id: deploy_key.id().into_inner(),
            server_id: server_id.into_inner(),
            title: deploy_key.title().map(str::to_owned),
            key_material: deploy_key.key_material().to_owned(),
            fingerprint: fingerprint.clone(),
            created_at: deploy_key.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(deploy_keys::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), DEPLOY_KEY_FINGERPRINT_INDEX) =>
                    {
                        FleetRepositoryError::DuplicateDeployKey {
                            server_id,
                            fingerprint: fingerprint.clone(),
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        FleetRepositoryError::ServerNotFound(server_id)
                    }
                    _ => FleetRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn remove_deploy_key(&self, deploy_key_id: DeployKeyId) -> FleetRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                deploy_keys::table.filter(deploy_keys::id.eq(deploy_key_id.into_inner())),
            )
            .execute(connection)
            .map_err(FleetRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_deploy_keys(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<DeployKey>> {
        self.run_blocking(move |connection| {
            let rows = deploy_keys::table
                .filter(deploy_keys::server_id.eq(server_id.into_inner()))
                .order(deploy_keys::created_at.asc())
                .select(DeployKeyRow::as_select())
                .load::<DeployKeyRow>(connection)
                .map_err(FleetRepositoryError::persistence)?;
            rows.into_iter().map(row_to_deploy_key).collect()
        })
        .await
    }

    async fn add_app(&self, app: &App) -> FleetRepositoryResult<()> {
        let server_id = app.server_id();
        let app_name = app.name().clone();
        let row = AppRow {
            id: app.id().into_inner(),
            server_id: server_id.into_inner(),
            name: app.name().as_str().to_owned(),
            created_at: app.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(apps::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), APP_NAME_INDEX) =>
                    {
                        FleetRepositoryError::DuplicateAppName {
                            server_id,
                            name: app_name.clone(),
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        FleetRepositoryError::ServerNotFound(server_id)
                    }
                    _ => FleetRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_apps(&self, server_id: ServerId) -> FleetRepositoryResult<Vec<App>> {
        self.run_blocking(move |connection| {
            let rows = apps::table
                .filter(apps::server_id.eq(server_id.into_inner()))
                .order(apps::name.asc())
                .select(AppRow::as_select())
                .load::<AppRow>(connection)
                .map_err(FleetRepositoryError::persistence)?;
            rows.into_iter().map(row_to_app).collect()
        })
        .await
    }
}

fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

fn server_to_row(server: &Server) -> ServerRow {
    ServerRow {
        id: server.id().into_inner(),
        name: server.name().as_str().to_owned(),
        address: server.address().as_str().to_owned(),
        public_key: server.keypair().public_key().to_owned(),
        private_key: server.keypair().private_key().to_owned(),
        runtime_version: server.runtime_version().map(str::to_owned),
        raw_status: server.raw_status().to_persisted(),
        created_at: server.created_at(),
        updated_at: server.updated_at(),
    }
}

fn binding_to_row(binding: &ServiceBinding) -> ServiceBindingRow {
    ServiceBindingRow {
        server_id: binding.server_id().into_inner(),
        service_id: binding.service_id().into_inner(),
        status: binding.status().as_str().to_owned(),
        created_at: binding.created_at(),
        updated_at: binding.updated_at(),
    }
}

fn row_to_server(row: ServerRow) -> FleetRepositoryResult<Server> {
    let ServerRow {
        id,
        name,
        address,
        public_key,
        private_key,
        runtime_version,
        raw_status,
        created_at,
        updated_at,
    } = row;

    let data = PersistedServerData {
        id: ServerId::from_uuid(id),
        name: ServerName::new(name).map_err(FleetRepositoryError::invalid_persisted_data)?,
        address: ServerAddress::new(address)
            .map_err(FleetRepositoryError::invalid_persisted_data)?,
        keypair: ServerKeypair::new(public_key, private_key)
            .map_err(FleetRepositoryError::invalid_persisted_data)?,
        runtime_version,
        raw_status: RawStatus::from_persisted(raw_status.as_deref()),
        created_at,
        updated_at,
    };
    Ok(Server::from_persisted(data))
}

fn row_to_service(row: ServiceRow) -> FleetRepositoryResult<Service> {
    let name = ServiceName::new(row.name).map_err(FleetRepositoryError::invalid_persisted_data)?;
    Ok(Service::from_persisted(
        ServiceId::from_uuid(row.id),
        name,
        row.created_at,
    ))
}

fn row_to_binding(row: ServiceBindingRow) -> FleetRepositoryResult<ServiceBinding> {
    let status = BindingStatus::try_from(row.status.as_str())
        .map_err(FleetRepositoryError::invalid_persisted_data)?;
    Ok(ServiceBinding::from_persisted(PersistedBindingData {
        server_id: ServerId::from_uuid(row.server_id),
        service_id: ServiceId::from_uuid(row.service_id),
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_deploy_key(row: DeployKeyRow) -> FleetRepositoryResult<DeployKey> {
    DeployKey::from_persisted(PersistedDeployKeyData {
        id: DeployKeyId::from_uuid(row.id),
        server_id: ServerId::from_uuid(row.server_id),
        title: row.title,
        key_material: row.key_material,
        created_at: row.created_at,
    })
    .map_err(FleetRepositoryError::invalid_persisted_data)
}

fn row_to_app(row: AppRow) -> FleetRepositoryResult<App> {
    let name = AppName::new(row.name).map_err(FleetRepositoryError::invalid_persisted_data)?;
    Ok(App::from_persisted(
        AppId::from_uuid(row.id),
        ServerId::from_uuid(row.server_id),
        name,
        row.created_at,
    ))
}
