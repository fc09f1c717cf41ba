//! Externally authorised deploy keys.

use super::{DeployKeyId, FleetDomainError, ServerId, keypair::fingerprint};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Public key permitted to deploy applications to one server.
///
/// Deploy keys are independent of the server's own generated keypair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployKey {
    id: DeployKeyId,
    server_id: ServerId,
    title: Option<String>,
    key_material: String,
    fingerprint: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted deploy key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDeployKeyData {
    /// Persisted key identifier.
    pub id: DeployKeyId,
    /// Owning server.
    pub server_id: ServerId,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Public key material.
    pub key_material: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl DeployKey {
    /// Creates a deploy key for a server.
    ///
    /// Key material is trimmed; titles are collapsed onto one line and a
    /// blank title is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::EmptyDeployKey`] when the key material is
    /// empty after trimming, or [`FleetDomainError::MultilineDeployKey`] when
    /// it spans several lines.
    pub fn new(
        server_id: ServerId,
        key_material: impl Into<String>,
        title: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, FleetDomainError> {
        let raw = key_material.into();
        let trimmed = validate_key_material(&raw)?;

        Ok(Self {
            id: DeployKeyId::new(),
            server_id,
            title: normalize_title(title),
            fingerprint: fingerprint(trimmed),
            key_material: trimmed.to_owned(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a deploy key from persistence, recomputing its fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError`] when the stored key material is invalid.
    pub fn from_persisted(data: PersistedDeployKeyData) -> Result<Self, FleetDomainError> {
        let trimmed = validate_key_material(&data.key_material)?;

        Ok(Self {
            id: data.id,
            server_id: data.server_id,
            title: normalize_title(data.title),
            fingerprint: fingerprint(trimmed),
            key_material: trimmed.to_owned(),
            created_at: data.created_at,
        })
    }

    /// Returns the key identifier.
    #[must_use]
    pub const fn id(&self) -> DeployKeyId {
        self.id
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the optional title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the public key material.
    #[must_use]
    pub fn key_material(&self) -> &str {
        &self.key_material
    }

    /// Returns the hex SHA-256 fingerprint of the key material.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_key_material(raw: &str) -> Result<&str, FleetDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FleetDomainError::EmptyDeployKey);
    }
    if trimmed.contains(['\n', '\r']) {
        return Err(FleetDomainError::MultilineDeployKey);
    }
    Ok(trimmed)
}

fn normalize_title(title: Option<String>) -> Option<String> {
    title
        .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|value| !value.is_empty())
}
