//! Error types for fleet domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or mutating fleet domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FleetDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name exceeds the 100-character storage limit.
    #[error("server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The server address is empty after trimming.
    #[error("server address must not be empty")]
    EmptyServerAddress,

    /// The server address contains whitespace.
    #[error("server address '{0}' must not contain whitespace")]
    InvalidServerAddress(String),

    /// The server address exceeds the 255-character storage limit.
    #[error("server address exceeds 255 character limit: {0}")]
    ServerAddressTooLong(String),

    /// The service name is empty after trimming.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// The service name contains characters outside `[a-z0-9_-]`.
    #[error(
        "service name '{0}' contains invalid characters (only lowercase alphanumeric, hyphens and underscores allowed)"
    )]
    InvalidServiceName(String),

    /// The service name exceeds the 100-character storage limit.
    #[error("service name exceeds 100 character limit: {0}")]
    ServiceNameTooLong(String),

    /// The app name is empty after trimming.
    #[error("app name must not be empty")]
    EmptyAppName,

    /// The app name contains characters outside `[a-z0-9_-]`.
    #[error(
        "app name '{0}' contains invalid characters (only lowercase alphanumeric, hyphens and underscores allowed)"
    )]
    InvalidAppName(String),

    /// The app name exceeds the 100-character storage limit.
    #[error("app name exceeds 100 character limit: {0}")]
    AppNameTooLong(String),

    /// Deploy key material is empty after trimming.
    #[error("deploy key material must not be empty")]
    EmptyDeployKey,

    /// Deploy key material spans more than one line.
    #[error("deploy key material must be a single line")]
    MultilineDeployKey,

    /// Rendering the authorised keys document failed.
    #[error("failed to render authorized keys: {0}")]
    AuthorizedKeysRender(String),

    /// One half of a server keypair is missing.
    #[error("server keypair is incomplete: {missing} key is empty")]
    IncompleteKeypair {
        /// Which half of the keypair is empty (`public` or `private`).
        missing: &'static str,
    },

    /// Transitioning a service binding between two statuses is invalid.
    #[error("invalid service binding transition: {from} -> {to}")]
    InvalidBindingTransition {
        /// Current binding status.
        from: String,
        /// Requested target binding status.
        to: String,
    },
}

/// Error returned while parsing a binding status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown service binding status: {0}")]
pub struct ParseBindingStatusError(pub String);
