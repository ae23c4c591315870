//! In-process host registry.
//!
//! # Responsibility
//! - Implement [`HostRegistry`] over plain in-memory tables.
//! - Dispatch service calls to the registered routing entries.
//! - Cache service descriptions the way a live host does.
//!
//! # Invariants
//! - At most one routing entry per `(domain, service)`.
//! - Loading a platform or collection also marks its domain component loaded.

use crate::capability::Capabilities;
use crate::host::entity::{Entity, EntitySource, EntitySourceHandle, NumberEntity};
use crate::host::HostRegistry;
use crate::service::call::ServiceCall;
use crate::service::description::ServiceDescription;
use crate::service::descriptor::ServiceKey;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::registration::Registration;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

struct LoadedPlatform {
    platform_id: String,
    source: EntitySourceHandle,
}

/// Host registry kept entirely in memory.
#[derive(Default)]
pub struct InMemoryHost {
    services: BTreeMap<ServiceKey, Registration>,
    description_cache: BTreeMap<ServiceKey, ServiceDescription>,
    components: BTreeSet<String>,
    platforms: BTreeMap<String, Vec<LoadedPlatform>>,
    collections: BTreeMap<String, EntitySourceHandle>,
    admin_restricted: bool,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, domain: impl Into<String>) -> Self {
        self.components.insert(domain.into());
        self
    }

    pub fn with_platform(
        mut self,
        domain: impl Into<String>,
        platform_id: impl Into<String>,
        source: EntitySourceHandle,
    ) -> Self {
        let domain = domain.into();
        self.components.insert(domain.clone());
        self.platforms.entry(domain).or_default().push(LoadedPlatform {
            platform_id: platform_id.into(),
            source,
        });
        self
    }

    pub fn with_collection(mut self, domain: impl Into<String>, source: EntitySourceHandle) -> Self {
        let domain = domain.into();
        self.components.insert(domain.clone());
        self.collections.insert(domain, source);
        self
    }

    /// Makes every admin registration attempt fail.
    pub fn restrict_admin(mut self) -> Self {
        self.admin_restricted = true;
        self
    }

    /// Dispatches one call to the routing entry under its key.
    pub fn call(&self, call: &ServiceCall) -> ServiceResult {
        let registration = self
            .services
            .get(&call.key)
            .ok_or_else(|| ServiceError::NotFound(call.key.clone()))?;
        registration.invoke(call)
    }

    pub fn registration(&self, key: &ServiceKey) -> Option<&Registration> {
        self.services.get(key)
    }

    pub fn service_keys(&self) -> Vec<ServiceKey> {
        self.services.keys().cloned().collect()
    }

    /// Returns the advertised description, generating and caching it on a miss.
    pub fn describe(&mut self, key: &ServiceKey) -> Option<ServiceDescription> {
        if let Some(cached) = self.description_cache.get(key) {
            return Some(cached.clone());
        }
        let generated = ServiceDescription::from_schema(self.services.get(key)?.schema());
        self.description_cache.insert(key.clone(), generated.clone());
        Some(generated)
    }

    pub fn cached_description(&self, key: &ServiceKey) -> Option<&ServiceDescription> {
        self.description_cache.get(key)
    }
}

impl HostRegistry for InMemoryHost {
    fn register(&mut self, key: &ServiceKey, registration: Registration) {
        if self.services.insert(key.clone(), registration).is_some() {
            warn!("event=host_service_overwrite module=host status=warn key={key}");
        }
    }

    fn register_admin(&mut self, key: &ServiceKey, registration: Registration) -> bool {
        if self.admin_restricted {
            debug!("event=host_admin_refused module=host status=skip key={key}");
            return false;
        }
        self.register(key, registration.require_admin());
        true
    }

    fn unregister(&mut self, key: &ServiceKey) {
        self.services.remove(key);
        self.description_cache.remove(key);
    }

    fn has_registration(&self, key: &ServiceKey) -> bool {
        self.services.contains_key(key)
    }

    fn pop_registration(&mut self, key: &ServiceKey) -> Option<Registration> {
        self.services.remove(key)
    }

    fn set_registration(&mut self, key: &ServiceKey, registration: Registration) {
        self.services.insert(key.clone(), registration);
    }

    fn set_description(&mut self, key: &ServiceKey, description: ServiceDescription) {
        self.description_cache.insert(key.clone(), description);
    }

    fn clear_description_cache(&mut self) {
        self.description_cache.clear();
    }

    fn find_platform(&self, domain: &str, platform_id: &str) -> Option<EntitySourceHandle> {
        self.platforms
            .get(domain)?
            .iter()
            .find(|platform| platform.platform_id == platform_id)
            .map(|platform| Arc::clone(&platform.source))
    }

    fn find_collection(&self, domain: &str) -> Option<EntitySourceHandle> {
        self.collections.get(domain).cloned()
    }

    fn is_component_loaded(&self, domain: &str) -> bool {
        self.components.contains(domain)
    }
}

/// Entity source backed by a fixed set of entities.
#[derive(Default)]
pub struct MemoryEntitySource {
    entities: BTreeMap<String, Arc<dyn Entity>>,
}

impl MemoryEntitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Arc<dyn Entity>) -> Self {
        self.entities.insert(entity.entity_id().to_string(), entity);
        self
    }

    pub fn into_handle(self) -> EntitySourceHandle {
        Arc::new(self)
    }
}

impl EntitySource for MemoryEntitySource {
    fn entity(&self, entity_id: &str) -> Option<Arc<dyn Entity>> {
        self.entities.get(entity_id).cloned()
    }

    fn entity_ids(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }
}

/// Number entity holding its value in memory.
#[derive(Debug)]
pub struct MemoryNumber {
    entity_id: String,
    features: Capabilities,
    value: RwLock<Option<f64>>,
    step: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl MemoryNumber {
    pub fn new(entity_id: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            features: Capabilities::NONE,
            value: RwLock::new(Some(value)),
            step: 1.0,
            min: None,
            max: None,
        }
    }

    /// Entity that has not reported a value yet.
    pub fn unknown(entity_id: impl Into<String>) -> Self {
        let number = Self::new(entity_id, 0.0);
        *number.value.write().unwrap_or_else(PoisonError::into_inner) = None;
        number
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_features(mut self, features: Capabilities) -> Self {
        self.features = features;
        self
    }

    pub fn value(&self) -> Option<f64> {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Entity for MemoryNumber {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn supported_features(&self) -> Capabilities {
        self.features
    }

    fn as_number(&self) -> Option<&dyn NumberEntity> {
        Some(self)
    }
}

impl NumberEntity for MemoryNumber {
    fn native_value(&self) -> Option<f64> {
        self.value()
    }

    fn step(&self) -> f64 {
        self.step
    }

    fn min_value(&self) -> Option<f64> {
        self.min
    }

    fn max_value(&self) -> Option<f64> {
        self.max
    }

    fn set_native_value(&self, value: f64) -> Result<(), ServiceError> {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
        Ok(())
    }
}
