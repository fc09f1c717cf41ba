//! Fleet management: managed servers, the service catalogue, and the
//! installation state of each service on each server.
//!
//! Creating a server generates its SSH keypair before anything is stored.
//! Attaching a service creates a binding in state `new`; only the external
//! installer moves it on. Runtime freshness and display status are derived
//! from stored fields on demand. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
