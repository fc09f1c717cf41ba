//! Quayside: control plane for a fleet of application-hosting servers.
//!
//! This crate provisions managed servers with SSH keypairs, tracks which
//! infrastructure services are installed on each server, decides whether a
//! server's runtime is current, and renders a normalized status for display.
//!
//! # Architecture
//!
//! Quayside follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, key
//!   generation, version lookup)
//!
//! # Modules
//!
//! - [`fleet`]: Servers, the service catalogue, service bindings, and status

pub mod fleet;
