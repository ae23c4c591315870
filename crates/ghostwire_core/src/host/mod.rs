//! Host-facing contracts.
//!
//! The manager never touches host internals directly; every registry
//! mutation goes through [`HostRegistry`].

pub mod entity;
pub mod memory;

use crate::service::description::ServiceDescription;
use crate::service::descriptor::ServiceKey;
use crate::service::registration::Registration;
use entity::EntitySourceHandle;

/// Narrow view of the live host's service, platform and component registries.
///
/// # Invariants
/// - `pop_registration` removes and returns in one step; the key is never
///   present in both the host table and a caller-held value.
/// - Lookups never mutate host state.
pub trait HostRegistry {
    /// Inserts a routing entry, replacing any entry under the same key.
    fn register(&mut self, key: &ServiceKey, registration: Registration);

    /// Inserts an admin routing entry; returns `false` when the host refuses it.
    fn register_admin(&mut self, key: &ServiceKey, registration: Registration) -> bool;

    fn unregister(&mut self, key: &ServiceKey);

    fn has_registration(&self, key: &ServiceKey) -> bool;

    fn pop_registration(&mut self, key: &ServiceKey) -> Option<Registration>;

    fn set_registration(&mut self, key: &ServiceKey, registration: Registration);

    /// Overrides the advertised description of one service.
    fn set_description(&mut self, key: &ServiceKey, description: ServiceDescription);

    /// Drops cached descriptions so they regenerate from live registrations.
    fn clear_description_cache(&mut self);

    fn find_platform(&self, domain: &str, platform_id: &str) -> Option<EntitySourceHandle>;

    fn find_collection(&self, domain: &str) -> Option<EntitySourceHandle>;

    fn is_component_loaded(&self, domain: &str) -> bool;
}
