//! Call-time errors shared by registrations and handlers.

use crate::capability::Capabilities;
use crate::service::descriptor::ServiceKey;
use crate::service::schema::ParamType;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Optional payload returned by a service call.
pub type ServiceResponse = Option<Value>;

pub type ServiceResult = Result<ServiceResponse, ServiceError>;

/// Rejection raised before a handler body runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NotAnObject,
    UnexpectedField(String),
    MissingField(String),
    InvalidType { field: String, expected: ParamType },
    MissingTarget,
    UnknownEntity(String),
    MissingCapabilities {
        entity_id: String,
        missing: Capabilities,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "service data must be an object"),
            Self::UnexpectedField(name) => write!(f, "extra keys not allowed: `{name}`"),
            Self::MissingField(name) => write!(f, "required key not provided: `{name}`"),
            Self::InvalidType { field, expected } => {
                write!(f, "expected {} for `{field}`", expected.as_str())
            }
            Self::MissingTarget => write!(f, "entity service call has no target entities"),
            Self::UnknownEntity(entity_id) => write!(f, "unknown target entity: {entity_id}"),
            Self::MissingCapabilities { entity_id, missing } => write!(
                f,
                "entity {entity_id} does not support required features {missing}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Failure returned to the caller of a service.
#[derive(Debug)]
pub enum ServiceError {
    /// No registration exists under the called key.
    NotFound(ServiceKey),
    /// Admin service called without admin privilege.
    Unauthorized(ServiceKey),
    Validation(ValidationError),
    /// Failure raised by the handler body itself.
    Handler(Box<dyn Error + Send + Sync>),
}

impl ServiceError {
    pub fn handler(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(err))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "service not found: {key}"),
            Self::Unauthorized(key) => write!(f, "admin privilege required for {key}"),
            Self::Validation(err) => write!(f, "invalid service call: {err}"),
            Self::Handler(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Handler(err) => Some(err.as_ref()),
            Self::NotFound(_) | Self::Unauthorized(_) => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
