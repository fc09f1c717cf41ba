//! Application services for server provisioning, service bindings, and
//! status reporting.

mod bindings;
mod provisioning;
mod status;

pub use bindings::{
    ServiceBindingService, ServiceBindingServiceError, ServiceBindingServiceResult,
};
pub use provisioning::{
    CreateServerRequest, ServerProvisioningService, ServerProvisioningServiceError,
    ServerProvisioningServiceResult,
};
pub use status::{
    ServerOverview, ServerStatusService, ServerStatusServiceError, ServerStatusServiceResult,
};
