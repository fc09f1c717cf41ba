//! Catalogue entry for an installable infrastructure service.

use super::{ServiceId, ServiceName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Installable infrastructure service offered to every server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    name: ServiceName,
    created_at: DateTime<Utc>,
}

impl Service {
    /// Creates a new catalogue entry.
    #[must_use]
    pub fn new(name: ServiceName, clock: &impl Clock) -> Self {
        Self {
            id: ServiceId::new(),
            name,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a catalogue entry from persistence.
    #[must_use]
    pub const fn from_persisted(id: ServiceId, name: ServiceName, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }

    /// Returns the service identifier.
    #[must_use]
    pub const fn id(&self) -> ServiceId {
        self.id
    }

    /// Returns the service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
