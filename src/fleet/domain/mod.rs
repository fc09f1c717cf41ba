//! Domain model for managed servers and their installed services.
//!
//! The fleet domain models server identity and credentials, the service
//! catalogue, per-server service bindings with their installation lifecycle,
//! deploy keys, hosted apps, runtime version freshness, and status display.
//! Infrastructure concerns remain outside this boundary.

mod access;
mod app;
mod binding;
mod deploy_key;
mod error;
mod ids;
mod keypair;
mod names;
mod server;
mod service;
mod status;
pub mod version;

pub use access::AccessCredentials;
pub use app::App;
pub use binding::{BindingStatus, PersistedBindingData, ServiceBinding, ServiceStatus};
pub use deploy_key::{DeployKey, PersistedDeployKeyData};
pub use error::{FleetDomainError, ParseBindingStatusError};
pub use ids::{AppId, DeployKeyId, ServerId, ServiceId};
pub use keypair::{ServerKeypair, fingerprint};
pub use names::{AppName, ServerAddress, ServerName, ServiceName};
pub use server::{PersistedServerData, Server};
pub use service::Service;
pub use status::{RawStatus, SETUP_NOT_FINISHED};
pub use version::{RuntimeVersion, is_up_to_date};
