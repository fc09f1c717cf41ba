//! Diesel row models for fleet persistence.

use super::schema::{apps, deploy_keys, servers, service_bindings, services};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row for server records, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Host name or IP address.
    pub address: String,
    /// OpenSSH-encoded public key.
    pub public_key: String,
    /// PEM-encoded private key.
    pub private_key: String,
    /// Last reported runtime version.
    pub runtime_version: Option<String>,
    /// Persisted agent status.
    pub raw_status: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row for the service catalogue.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceRow {
    /// Internal service identifier.
    pub id: uuid::Uuid,
    /// Unique service slug.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row for service bindings.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = service_bindings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServiceBindingRow {
    /// Owning server.
    pub server_id: uuid::Uuid,
    /// Bound service.
    pub service_id: uuid::Uuid,
    /// Installation status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row for deploy keys.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = deploy_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeployKeyRow {
    /// Internal deploy key identifier.
    pub id: uuid::Uuid,
    /// Owning server.
    pub server_id: uuid::Uuid,
    /// Optional display title.
    pub title: Option<String>,
    /// Public key material.
    pub key_material: String,
    /// Hex SHA-256 fingerprint.
    pub fingerprint: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row for hosted apps.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = apps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AppRow {
    /// Internal app identifier.
    pub id: uuid::Uuid,
    /// Owning server.
    pub server_id: uuid::Uuid,
    /// App slug.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
