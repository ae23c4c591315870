//! Extension service registration and override management.
//!
//! Installs extension services into a live host registry, supersedes host
//! services the extension replaces, and restores them on teardown.

pub mod capability;
pub mod host;
pub mod logging;
pub mod manager;
pub mod service;

/// Namespace of services owned by this extension.
pub const EXTENSION_DOMAIN: &str = "ghostwire";

pub use capability::Capabilities;
pub use host::entity::{Entity, EntitySource, EntitySourceHandle, NumberEntity};
pub use host::memory::{InMemoryHost, MemoryEntitySource, MemoryNumber};
pub use host::HostRegistry;
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use manager::context::ActivationContext;
pub use manager::error::SetupError;
pub use manager::service_manager::{ServiceManager, TeardownReport};
pub use manager::vault::{OverrideVault, VaultError};
pub use service::call::{CallContext, ServiceCall, ServiceRequest};
pub use service::catalog::{CatalogError, ServiceCatalog};
pub use service::description::{
    DescriptionError, DescriptionTable, FieldDescription, ServiceDescription,
};
pub use service::descriptor::{DescriptorError, ServiceDescriptor, ServiceKey, ServiceKind};
pub use service::error::{ServiceError, ServiceResponse, ServiceResult, ValidationError};
pub use service::handler::{CallTarget, HandlerRef, ServiceHandler};
pub use service::registration::{Registration, RegistrationId};
pub use service::schema::{FieldSpec, ParamSchema, ParamType, ServiceData};
pub use service::strategy::{RegisterOutcome, RegistrationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
