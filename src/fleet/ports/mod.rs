//! Port contracts for fleet persistence, key provisioning, and version lookup.

mod key_provisioner;
mod repository;
mod version_source;

pub use key_provisioner::{
    DEFAULT_KEY_BITS, KeyProvisionError, KeyProvisioner, KeyProvisioningConfig,
};
pub use repository::{FleetRepository, FleetRepositoryError, FleetRepositoryResult};
pub use version_source::{VersionSource, VersionSourceError};
