//! Host entity contracts consumed by entity-targeted services.

use crate::capability::Capabilities;
use crate::service::error::ServiceError;
use std::sync::Arc;

/// One host entity as seen by service handlers.
pub trait Entity: Send + Sync {
    fn entity_id(&self) -> &str;

    /// Feature flags advertised by this entity.
    fn supported_features(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Number facet, for entities of the `number` domain.
    fn as_number(&self) -> Option<&dyn NumberEntity> {
        None
    }
}

/// Numeric value entity.
pub trait NumberEntity {
    fn native_value(&self) -> Option<f64>;
    fn step(&self) -> f64;
    fn min_value(&self) -> Option<f64>;
    fn max_value(&self) -> Option<f64>;
    fn set_native_value(&self, value: f64) -> Result<(), ServiceError>;
}

/// Loaded platform or domain collection that can resolve entities.
pub trait EntitySource: Send + Sync {
    fn entity(&self, entity_id: &str) -> Option<Arc<dyn Entity>>;

    /// Sorted ids of all entities this source provides.
    fn entity_ids(&self) -> Vec<String>;
}

pub type EntitySourceHandle = Arc<dyn EntitySource>;
