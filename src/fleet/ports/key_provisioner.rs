//! Key provisioning port used while creating servers.

use crate::fleet::domain::ServerKeypair;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Default RSA modulus size in bits.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Generates the access keypair for a new server.
///
/// Implementations run synchronously and perform no network I/O.
pub trait KeyProvisioner: Send + Sync {
    /// Generates a fresh keypair.
    ///
    /// # Errors
    ///
    /// Returns [`KeyProvisionError`] when key generation or encoding fails.
    fn generate(&self) -> Result<ServerKeypair, KeyProvisionError>;
}

/// Errors raised while generating a server keypair.
#[derive(Debug, Clone, Error)]
pub enum KeyProvisionError {
    /// The configured key size is unusable.
    #[error("unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    Generation(Arc<dyn std::error::Error + Send + Sync>),

    /// Encoding the generated key failed.
    #[error("key encoding failed: {0}")]
    Encoding(Arc<dyn std::error::Error + Send + Sync>),

    /// The generated keypair was rejected by the domain.
    #[error("generated keypair is invalid: {0}")]
    InvalidKeypair(String),
}

impl KeyProvisionError {
    /// Wraps a key generation failure.
    pub fn generation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Generation(Arc::new(err))
    }

    /// Wraps a key encoding failure.
    pub fn encoding(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Encoding(Arc::new(err))
    }
}

/// Configuration for key provisioning.
///
/// # Examples
///
/// ```
/// use quayside::fleet::ports::KeyProvisioningConfig;
///
/// let config = KeyProvisioningConfig::default();
/// assert_eq!(config.key_bits, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyProvisioningConfig {
    /// RSA modulus size in bits.
    pub key_bits: usize,
}

impl Default for KeyProvisioningConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

impl KeyProvisioningConfig {
    /// Creates a configuration with an explicit key size.
    #[must_use]
    pub const fn with_key_bits(key_bits: usize) -> Self {
        Self { key_bits }
    }
}
