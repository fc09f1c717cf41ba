//! Managed server aggregate root.

use super::{RawStatus, ServerAddress, ServerId, ServerKeypair, ServerName, version};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::borrow::Cow;

/// Remote host running the PaaS runtime.
///
/// A server owns its generated keypair from the moment it exists: the
/// constructor takes a complete [`ServerKeypair`] and no method replaces it.
/// Apps, service bindings, and deploy keys reference the server by
/// [`ServerId`] and are removed together with it by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    id: ServerId,
    name: ServerName,
    address: ServerAddress,
    keypair: ServerKeypair,
    runtime_version: Option<String>,
    raw_status: RawStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted server identifier.
    pub id: ServerId,
    /// Persisted server name.
    pub name: ServerName,
    /// Persisted network address.
    pub address: ServerAddress,
    /// Persisted keypair.
    pub keypair: ServerKeypair,
    /// Persisted runtime version, if reported.
    pub runtime_version: Option<String>,
    /// Persisted raw status.
    pub raw_status: RawStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Server {
    /// Creates a server with a freshly generated keypair.
    ///
    /// The runtime version is unknown and the status unset until
    /// orchestration reports them.
    #[must_use]
    pub fn new(
        name: ServerName,
        address: ServerAddress,
        keypair: ServerKeypair,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ServerId::new(),
            name,
            address,
            keypair,
            runtime_version: None,
            raw_status: RawStatus::Unset,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            address: data.address,
            keypair: data.keypair,
            runtime_version: data.runtime_version,
            raw_status: data.raw_status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the network address.
    #[must_use]
    pub const fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Returns the generated keypair.
    #[must_use]
    pub const fn keypair(&self) -> &ServerKeypair {
        &self.keypair
    }

    /// Returns the reported runtime version, if any.
    #[must_use]
    pub fn runtime_version(&self) -> Option<&str> {
        self.runtime_version.as_deref()
    }

    /// Returns the raw orchestration status.
    #[must_use]
    pub const fn raw_status(&self) -> &RawStatus {
        &self.raw_status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the human-readable status token.
    #[must_use]
    pub fn formatted_status(&self) -> Cow<'_, str> {
        self.raw_status.display_token()
    }

    /// Returns whether the runtime is at or beyond `latest_version`.
    #[must_use]
    pub fn is_up_to_date(&self, latest_version: &str) -> bool {
        version::is_up_to_date(self.runtime_version(), latest_version)
    }

    /// Records the runtime version reported by the server.
    ///
    /// A blank version clears the stored value.
    pub fn record_runtime_version(&mut self, runtime_version: Option<String>, clock: &impl Clock) {
        self.runtime_version = runtime_version
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        self.touch(clock);
    }

    /// Records the raw status reported by orchestration.
    pub fn record_raw_status(&mut self, raw_status: RawStatus, clock: &impl Clock) {
        self.raw_status = raw_status;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
