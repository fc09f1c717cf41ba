//! Per-server service installation binding and its lifecycle.

use super::{FleetDomainError, ParseBindingStatusError, ServerId, ServiceId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Installation status of a service on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    /// The service is attached but installation has not started.
    New,
    /// The external installer is installing the service.
    Installing,
    /// The service is installed.
    Installed,
    /// The last installation attempt failed; a retry may start again.
    Failed,
}

impl BindingStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the installer may move a binding to `target`.
    ///
    /// Rewriting the current status is accepted as an idempotent write.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::New | Self::Installing)
                | (
                    Self::Installing,
                    Self::Installing | Self::Installed | Self::Failed
                )
                | (Self::Installed | Self::Failed, Self::Installing)
                | (Self::Installed, Self::Installed)
                | (Self::Failed, Self::Failed)
        )
    }
}

impl fmt::Display for BindingStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BindingStatus {
    type Error = ParseBindingStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "installing" => Ok(Self::Installing),
            "installed" => Ok(Self::Installed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseBindingStatusError(value.to_owned())),
        }
    }
}

/// Status of a service on a server as seen by callers.
///
/// A pair without a binding is reported as [`ServiceStatus::Absent`], which
/// renders the same as a fresh binding: `"new"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceStatus {
    /// No binding exists for the pair.
    Absent,
    /// A binding exists with the given status.
    Bound(BindingStatus),
}

impl ServiceStatus {
    /// Returns the display form; absent pairs read as `new`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => BindingStatus::New.as_str(),
            Self::Bound(status) => status.as_str(),
        }
    }

    /// Returns the binding status when a binding exists.
    #[must_use]
    pub const fn binding_status(self) -> Option<BindingStatus> {
        match self {
            Self::Absent => None,
            Self::Bound(status) => Some(status),
        }
    }
}

impl From<Option<BindingStatus>> for ServiceStatus {
    fn from(value: Option<BindingStatus>) -> Self {
        value.map_or(Self::Absent, Self::Bound)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Attachment of a catalogue service to a server.
///
/// There is at most one binding per `(server, service)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    server_id: ServerId,
    service_id: ServiceId,
    status: BindingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBindingData {
    /// Owning server.
    pub server_id: ServerId,
    /// Attached service.
    pub service_id: ServiceId,
    /// Persisted status.
    pub status: BindingStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ServiceBinding {
    /// Creates a binding in the [`BindingStatus::New`] state.
    #[must_use]
    pub fn new(server_id: ServerId, service_id: ServiceId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            server_id,
            service_id,
            status: BindingStatus::New,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a binding from persistence.
    #[must_use]
    pub const fn from_persisted(data: PersistedBindingData) -> Self {
        Self {
            server_id: data.server_id,
            service_id: data.service_id,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the attached service identifier.
    #[must_use]
    pub const fn service_id(&self) -> ServiceId {
        self.service_id
    }

    /// Returns the installation status.
    #[must_use]
    pub const fn status(&self) -> BindingStatus {
        self.status
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

    /// Applies a status reported by the external installer.
    ///
    /// Returns `true` when the status changed and `false` for an idempotent
    /// rewrite of the current status.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::InvalidBindingTransition`] when the
    /// transition is not allowed.
    pub fn transition_to(
        &mut self,
        target: BindingStatus,
        clock: &impl Clock,
    ) -> Result<bool, FleetDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(FleetDomainError::InvalidBindingTransition {
                from: self.status.as_str().to_owned(),
                to: target.as_str().to_owned(),
            });
        }

        if self.status == target {
            return Ok(false);
        }

        self.status = target;
        self.updated_at = clock.utc();
        Ok(true)
    }
}
