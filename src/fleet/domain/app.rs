//! Applications hosted on a server.

use super::{AppId, AppName, ServerId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Application owned by exactly one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    id: AppId,
    server_id: ServerId,
    name: AppName,
    created_at: DateTime<Utc>,
}

impl App {
    /// Creates an app record on a server.
    #[must_use]
    pub fn new(server_id: ServerId, name: AppName, clock: &impl Clock) -> Self {
        Self {
            id: AppId::new(),
            server_id,
            name,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an app record from persistence.
    #[must_use]
    pub const fn from_persisted(
        id: AppId,
        server_id: ServerId,
        name: AppName,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            server_id,
            name,
            created_at,
        }
    }

    /// Returns the app identifier.
    #[must_use]
    pub const fn id(&self) -> AppId {
        self.id
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the app name.
    #[must_use]
    pub const fn name(&self) -> &AppName {
        &self.name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
