//! Service descriptor metadata.
//!
//! # Responsibility
//! - Identify one service by `(domain, service)`.
//! - Declare the registration kind and the accepted call parameters.
//!
//! # Invariants
//! - `domain` and `service` are lowercase slugs (`[a-z0-9]+(_[a-z0-9]+)*`).
//! - `platform` is set for `ServiceKind::Entity` and for no other kind.
//! - Capability requirements only apply to entity-targeted kinds.

use crate::capability::Capabilities;
use crate::service::schema::ParamSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:_[a-z0-9]+)*$").expect("valid slug regex"));

/// Registry key of one service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceKey {
    pub domain: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
        }
    }

    /// Lookup key used by the packaged description table.
    pub fn description_key(&self) -> String {
        format!("{}_{}", self.domain, self.service)
    }
}

impl Display for ServiceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.domain, self.service)
    }
}

/// Registration strategy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceKind {
    /// Domain service callable by anyone.
    Plain,
    /// Domain service that requires an admin call context.
    Admin,
    /// Entity service scoped to one platform of a domain.
    Entity,
    /// Entity service over every entity of a domain.
    EntityCollection,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Admin => "admin",
            Self::Entity => "entity",
            Self::EntityCollection => "entity_collection",
        }
    }

    /// Whether calls are routed to individual target entities.
    pub fn targets_entities(self) -> bool {
        matches!(self, Self::Entity | Self::EntityCollection)
    }
}

/// Immutable description of one service a handler provides.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    key: ServiceKey,
    kind: ServiceKind,
    schema: Option<ParamSchema>,
    required_capabilities: Option<Capabilities>,
    platform: Option<String>,
}

impl ServiceDescriptor {
    pub fn new(domain: impl Into<String>, service: impl Into<String>, kind: ServiceKind) -> Self {
        Self {
            key: ServiceKey::new(domain, service),
            kind,
            schema: None,
            required_capabilities: None,
            platform: None,
        }
    }

    pub fn plain(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self::new(domain, service, ServiceKind::Plain)
    }

    pub fn admin(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self::new(domain, service, ServiceKind::Admin)
    }

    pub fn entity(
        domain: impl Into<String>,
        service: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self::new(domain, service, ServiceKind::Entity).with_platform(platform)
    }

    pub fn entity_collection(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self::new(domain, service, ServiceKind::EntityCollection)
    }

    pub fn with_schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_required_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.required_capabilities = Some(capabilities);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn domain(&self) -> &str {
        &self.key.domain
    }

    pub fn service(&self) -> &str {
        &self.key.service
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn schema(&self) -> Option<&ParamSchema> {
        self.schema.as_ref()
    }

    pub fn required_capabilities(&self) -> Capabilities {
        self.required_capabilities.unwrap_or(Capabilities::NONE)
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Validates declaration-level descriptor invariants.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if !SLUG_RE.is_match(&self.key.domain) {
            return Err(DescriptorError::InvalidDomain(self.key.domain.clone()));
        }
        if !SLUG_RE.is_match(&self.key.service) {
            return Err(DescriptorError::InvalidService(self.key.service.clone()));
        }

        match (self.kind, self.platform.as_deref()) {
            (ServiceKind::Entity, None) => return Err(DescriptorError::MissingPlatform),
            (ServiceKind::Entity, Some(platform)) if !SLUG_RE.is_match(platform) => {
                return Err(DescriptorError::InvalidPlatform(platform.to_string()));
            }
            (ServiceKind::Entity, Some(_)) => {}
            (kind, Some(_)) => return Err(DescriptorError::PlatformNotApplicable(kind)),
            (_, None) => {}
        }

        if self.required_capabilities.is_some() && !self.kind.targets_entities() {
            return Err(DescriptorError::CapabilitiesNotApplicable(self.kind));
        }
        Ok(())
    }
}

/// Descriptor declaration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    InvalidDomain(String),
    InvalidService(String),
    InvalidPlatform(String),
    MissingPlatform,
    PlatformNotApplicable(ServiceKind),
    CapabilitiesNotApplicable(ServiceKind),
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDomain(value) => write!(f, "service domain is invalid: {value}"),
            Self::InvalidService(value) => write!(f, "service name is invalid: {value}"),
            Self::InvalidPlatform(value) => write!(f, "platform id is invalid: {value}"),
            Self::MissingPlatform => write!(f, "entity service must declare a platform"),
            Self::PlatformNotApplicable(kind) => {
                write!(f, "{} service must not declare a platform", kind.as_str())
            }
            Self::CapabilitiesNotApplicable(kind) => write!(
                f,
                "{} service must not declare required capabilities",
                kind.as_str()
            ),
        }
    }
}

impl Error for DescriptorError {}
