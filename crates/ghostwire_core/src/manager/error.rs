//! Setup-time errors. Any of these aborts the activation.

use crate::manager::vault::VaultError;
use crate::service::descriptor::{DescriptorError, ServiceKey};
use crate::service::strategy::RegistrationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    InvalidDescriptor {
        key: ServiceKey,
        source: DescriptorError,
    },
    /// Two handlers of one activation share a key.
    DuplicateService(ServiceKey),
    /// Entity service platform is not loaded.
    PlatformNotFound { key: ServiceKey, platform: String },
    /// Entity collection service domain has no collection.
    CollectionNotFound(ServiceKey),
    AlreadyCaptured(ServiceKey),
}

impl SetupError {
    pub fn key(&self) -> &ServiceKey {
        match self {
            Self::InvalidDescriptor { key, .. }
            | Self::DuplicateService(key)
            | Self::PlatformNotFound { key, .. }
            | Self::CollectionNotFound(key)
            | Self::AlreadyCaptured(key) => key,
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDescriptor { key, source } => {
                write!(f, "invalid service descriptor {key}: {source}")
            }
            Self::DuplicateService(key) => write!(f, "service registered twice: {key}"),
            Self::PlatformNotFound { key, platform } => write!(
                f,
                "could not find platform {platform} for domain {} to register service: {key}",
                key.domain
            ),
            Self::CollectionNotFound(key) => write!(
                f,
                "could not find entity collection {} to register service: {key}",
                key.domain
            ),
            Self::AlreadyCaptured(key) => write!(f, "override already captured for {key}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDescriptor { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RegistrationError> for SetupError {
    fn from(value: RegistrationError) -> Self {
        match value {
            RegistrationError::PlatformNotFound { key, platform } => {
                Self::PlatformNotFound { key, platform }
            }
            RegistrationError::CollectionNotFound(key) => Self::CollectionNotFound(key),
        }
    }
}

impl From<VaultError> for SetupError {
    fn from(value: VaultError) -> Self {
        match value {
            VaultError::AlreadyCaptured(key) => Self::AlreadyCaptured(key),
        }
    }
}
