//! Deterministic key provisioner for tests and local flows.

use crate::fleet::{
    domain::ServerKeypair,
    ports::{KeyProvisionError, KeyProvisioner},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Key provisioner producing cheap, unique placeholder keypairs.
///
/// Generation can be switched to fail so that creation rollback paths can be
/// exercised without real cryptography.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyProvisioner {
    issued: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl InMemoryKeyProvisioner {
    /// Creates a provisioner that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent generations fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns how many keypairs have been issued.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl KeyProvisioner for InMemoryKeyProvisioner {
    fn generate(&self) -> Result<ServerKeypair, KeyProvisionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KeyProvisionError::generation(std::io::Error::other(
                "key generation disabled",
            )));
        }

        let serial = self.issued.fetch_add(1, Ordering::SeqCst);
        ServerKeypair::new(
            format!("test-public-key-{serial}"),
            format!("test-private-key-{serial}"),
        )
        .map_err(|err| KeyProvisionError::InvalidKeypair(err.to_string()))
    }
}
