//! Service handler contract.

use crate::host::entity::Entity;
use crate::service::call::ServiceRequest;
use crate::service::descriptor::ServiceDescriptor;
use crate::service::error::ServiceResult;
use std::sync::Arc;

/// What a routed call is applied to.
#[derive(Clone, Copy)]
pub enum CallTarget<'a> {
    /// Domain-level call (`Plain` and `Admin` kinds).
    Service,
    /// One resolved entity (`Entity` and `EntityCollection` kinds).
    Entity(&'a dyn Entity),
}

/// One extension service: metadata plus call logic.
///
/// The registration strategy is chosen from `descriptor().kind()`; the
/// handler itself only implements the call body.
pub trait ServiceHandler: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Whether this handler supersedes an existing host registration.
    fn is_replacing(&self) -> bool {
        false
    }

    /// Runs the service body for one validated call.
    ///
    /// Entity-targeted kinds are invoked once per resolved target entity, after
    /// capability checks have passed for every target.
    fn handle(&self, target: CallTarget<'_>, request: &ServiceRequest<'_>) -> ServiceResult;
}

pub type HandlerRef = Arc<dyn ServiceHandler>;
