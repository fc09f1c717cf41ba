//! Step definitions for service binding BDD scenarios.

mod given;
pub mod world;
