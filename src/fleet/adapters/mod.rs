//! Adapter implementations for fleet persistence, key provisioning, and
//! version lookup.

pub mod memory;
pub mod postgres;

mod rsa_keys;
mod version_source;

pub use rsa_keys::RsaKeyProvisioner;
pub use version_source::StaticVersionSource;
