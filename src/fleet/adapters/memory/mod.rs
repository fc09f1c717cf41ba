//! In-memory adapters for tests and embedded use.

mod keys;
mod repository;

pub use keys::InMemoryKeyProvisioner;
pub use repository::InMemoryFleetRepository;
