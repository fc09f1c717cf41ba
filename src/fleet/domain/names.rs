//! Validated name and address types for fleet records.

use super::FleetDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for server, service, and app names, matching `VARCHAR(100)`.
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for a server address, matching `VARCHAR(255)`.
const MAX_ADDRESS_LENGTH: usize = 255;

/// Validated, human-readable server name.
///
/// Server names are unique across the fleet. Surrounding whitespace is
/// trimmed; case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    /// Creates a validated server name.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::EmptyServerName`] when the value is empty
    /// after trimming or [`FleetDomainError::ServerNameTooLong`] when it
    /// exceeds 100 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, FleetDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(FleetDomainError::EmptyServerName);
        }

        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(FleetDomainError::ServerNameTooLong(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServerName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Network address of a managed server (IP literal or host name).
///
/// The address is stored as given after trimming; it is never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Creates a validated server address.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::EmptyServerAddress`] when the value is
    /// empty after trimming, [`FleetDomainError::InvalidServerAddress`] when
    /// it contains inner whitespace, or
    /// [`FleetDomainError::ServerAddressTooLong`] when it exceeds 255
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, FleetDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(FleetDomainError::EmptyServerAddress);
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(FleetDomainError::InvalidServerAddress(raw));
        }

        if trimmed.chars().count() > MAX_ADDRESS_LENGTH {
            return Err(FleetDomainError::ServerAddressTooLong(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated catalogue service name such as `redis` or `postgres`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a validated service name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_-]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, FleetDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(FleetDomainError::EmptyServiceName);
        }

        if normalized.chars().count() > MAX_NAME_LENGTH {
            return Err(FleetDomainError::ServiceNameTooLong(raw));
        }

        if !is_slug(&normalized) {
            return Err(FleetDomainError::InvalidServiceName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the service name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated app name, unique per server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    /// Creates a validated app name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_-]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, FleetDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(FleetDomainError::EmptyAppName);
        }

        if normalized.chars().count() > MAX_NAME_LENGTH {
            return Err(FleetDomainError::AppNameTooLong(raw));
        }

        if !is_slug(&normalized) {
            return Err(FleetDomainError::InvalidAppName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the app name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn is_slug(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
