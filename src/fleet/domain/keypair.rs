//! Server access keypair and key fingerprints.

use super::FleetDomainError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Public/private keypair generated for a server at creation time.
///
/// Both halves are always non-empty. The private half is redacted from the
/// [`fmt::Debug`] output so that keypairs can appear in logs and test
/// failures without leaking key material.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerKeypair {
    public_key: String,
    private_key: String,
}

impl ServerKeypair {
    /// Creates a keypair from encoded public and private halves.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::IncompleteKeypair`] when either half is
    /// empty after trimming.
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Result<Self, FleetDomainError> {
        let public = public_key.into();
        let private = private_key.into();

        if public.trim().is_empty() {
            return Err(FleetDomainError::IncompleteKeypair { missing: "public" });
        }
        if private.trim().is_empty() {
            return Err(FleetDomainError::IncompleteKeypair { missing: "private" });
        }

        Ok(Self {
            public_key: public,
            private_key: private,
        })
    }

    /// Returns the encoded public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Returns the encoded private key.
    #[must_use]
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Returns the hex-encoded SHA-256 fingerprint of the public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key)
    }
}

impl fmt::Debug for ServerKeypair {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerKeypair")
            .field("fingerprint", &self.fingerprint())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Returns the hex-encoded SHA-256 digest of trimmed key material.
#[must_use]
pub fn fingerprint(key_material: &str) -> String {
    let digest = Sha256::digest(key_material.trim().as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
