//! Routing entries stored in the host service table.
//!
//! # Invariants
//! - Every registration carries a unique id; restoring a captured
//!   registration restores the same id.
//! - Admin and schema checks run before the route is entered.

use crate::service::call::{ServiceCall, ServiceRequest};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::schema::ParamSchema;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of one registration; equal ids mean the same dispatch target.
pub type RegistrationId = Uuid;

type ServiceRoute = Arc<dyn Fn(&ServiceRequest<'_>) -> ServiceResult + Send + Sync>;

/// Callable routing entry keyed by `(domain, service)` in the host.
#[derive(Clone)]
pub struct Registration {
    id: RegistrationId,
    schema: Option<ParamSchema>,
    requires_admin: bool,
    route: ServiceRoute,
}

impl Registration {
    pub fn new<F>(schema: Option<ParamSchema>, route: F) -> Self
    where
        F: Fn(&ServiceRequest<'_>) -> ServiceResult + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            schema,
            requires_admin: false,
            route: Arc::new(route),
        }
    }

    pub fn require_admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn schema(&self) -> Option<&ParamSchema> {
        self.schema.as_ref()
    }

    pub fn requires_admin(&self) -> bool {
        self.requires_admin
    }

    /// Checks privilege, validates the payload, then forwards to the route.
    pub fn invoke(&self, call: &ServiceCall) -> ServiceResult {
        if self.requires_admin && !call.context.is_admin {
            return Err(ServiceError::Unauthorized(call.key.clone()));
        }

        let data = match &self.schema {
            Some(schema) => schema.validate(&call.data)?,
            None => ParamSchema::validate_empty(&call.data)?,
        };
        let request = ServiceRequest {
            key: &call.key,
            data,
            target: &call.target,
            context: &call.context,
        };
        (self.route)(&request)
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .field("requires_admin", &self.requires_admin)
            .finish_non_exhaustive()
    }
}
