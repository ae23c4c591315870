//! Registration strategies, one per [`ServiceKind`].
//!
//! # Invariants
//! - A strategy inserts at most one routing entry, under the descriptor key.
//! - Domain services against an unloaded foreign domain are skipped, not failed.
//! - Entity services fail hard when their platform or collection is absent.
//! - Entity calls are fully resolved and capability-checked before any
//!   handler body runs.

use crate::capability::Capabilities;
use crate::host::entity::{EntitySource, EntitySourceHandle};
use crate::host::HostRegistry;
use crate::service::call::ServiceRequest;
use crate::service::descriptor::{ServiceKey, ServiceKind};
use crate::service::error::{ServiceResult, ValidationError};
use crate::service::handler::{CallTarget, HandlerRef, ServiceHandler};
use crate::service::registration::Registration;
use crate::EXTENSION_DOMAIN;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Result of running a registration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Installed,
    /// Target domain is not loaded; the handler stays inert.
    Skipped,
    /// The host refused an admin registration.
    Rejected,
}

impl RegisterOutcome {
    pub fn is_installed(self) -> bool {
        self == Self::Installed
    }
}

/// Hard registration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    PlatformNotFound { key: ServiceKey, platform: String },
    CollectionNotFound(ServiceKey),
}

impl Display for RegistrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
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
        }
    }
}

impl Error for RegistrationError {}

type RegisterFn = fn(&mut dyn HostRegistry, &HandlerRef) -> Result<RegisterOutcome, RegistrationError>;

fn strategy_for(kind: ServiceKind) -> RegisterFn {
    match kind {
        ServiceKind::Plain => register_plain,
        ServiceKind::Admin => register_admin,
        ServiceKind::Entity => register_entity,
        ServiceKind::EntityCollection => register_entity_collection,
    }
}

/// Registers one handler using the strategy selected by its kind.
pub fn register(
    host: &mut dyn HostRegistry,
    handler: &HandlerRef,
) -> Result<RegisterOutcome, RegistrationError> {
    strategy_for(handler.descriptor().kind())(host, handler)
}

/// Removes the handler's routing entry from the host.
pub fn unregister(host: &mut dyn HostRegistry, handler: &HandlerRef) {
    let key = handler.descriptor().key();
    debug!("event=service_unregister module=services status=ok key={key}");
    host.unregister(key);
}

fn register_plain(
    host: &mut dyn HostRegistry,
    handler: &HandlerRef,
) -> Result<RegisterOutcome, RegistrationError> {
    let key = handler.descriptor().key();
    if !domain_available(&*host, &key.domain) {
        debug!(
            "event=service_register module=services status=skip kind=plain key={key} reason=domain_not_loaded"
        );
        return Ok(RegisterOutcome::Skipped);
    }

    debug!("event=service_register module=services status=ok kind=plain key={key}");
    host.register(key, service_registration(handler));
    Ok(RegisterOutcome::Installed)
}

fn register_admin(
    host: &mut dyn HostRegistry,
    handler: &HandlerRef,
) -> Result<RegisterOutcome, RegistrationError> {
    let key = handler.descriptor().key();
    if !domain_available(&*host, &key.domain) {
        debug!(
            "event=service_register module=services status=skip kind=admin key={key} reason=domain_not_loaded"
        );
        return Ok(RegisterOutcome::Skipped);
    }

    if !host.register_admin(key, service_registration(handler).require_admin()) {
        warn!("event=service_register module=services status=rejected kind=admin key={key}");
        return Ok(RegisterOutcome::Rejected);
    }
    debug!("event=service_register module=services status=ok kind=admin key={key}");
    Ok(RegisterOutcome::Installed)
}

fn register_entity(
    host: &mut dyn HostRegistry,
    handler: &HandlerRef,
) -> Result<RegisterOutcome, RegistrationError> {
    let descriptor = handler.descriptor();
    let key = descriptor.key();
    let platform = descriptor.platform().unwrap_or_default();

    let source = host.find_platform(&key.domain, platform).ok_or_else(|| {
        RegistrationError::PlatformNotFound {
            key: key.clone(),
            platform: platform.to_string(),
        }
    })?;

    debug!(
        "event=service_register module=services status=ok kind=entity key={key} platform={platform}"
    );
    host.register(key, entity_registration(handler, source));
    Ok(RegisterOutcome::Installed)
}

fn register_entity_collection(
    host: &mut dyn HostRegistry,
    handler: &HandlerRef,
) -> Result<RegisterOutcome, RegistrationError> {
    let key = handler.descriptor().key();
    let source = host
        .find_collection(&key.domain)
        .ok_or_else(|| RegistrationError::CollectionNotFound(key.clone()))?;

    debug!("event=service_register module=services status=ok kind=entity_collection key={key}");
    host.register(key, entity_registration(handler, source));
    Ok(RegisterOutcome::Installed)
}

fn domain_available(host: &dyn HostRegistry, domain: &str) -> bool {
    domain == EXTENSION_DOMAIN || host.is_component_loaded(domain)
}

fn service_registration(handler: &HandlerRef) -> Registration {
    let target = Arc::clone(handler);
    Registration::new(handler.descriptor().schema().cloned(), move |request| {
        target.handle(CallTarget::Service, request)
    })
}

fn entity_registration(handler: &HandlerRef, source: EntitySourceHandle) -> Registration {
    let target = Arc::clone(handler);
    let required = handler.descriptor().required_capabilities();
    Registration::new(handler.descriptor().schema().cloned(), move |request| {
        dispatch_to_entities(target.as_ref(), source.as_ref(), required, request)
    })
}

fn dispatch_to_entities(
    handler: &dyn ServiceHandler,
    source: &dyn EntitySource,
    required: Capabilities,
    request: &ServiceRequest<'_>,
) -> ServiceResult {
    if request.target.is_empty() {
        return Err(ValidationError::MissingTarget.into());
    }

    let mut seen = BTreeSet::new();
    let mut entities = Vec::with_capacity(request.target.len());
    for entity_id in request.target {
        if !seen.insert(entity_id.as_str()) {
            continue;
        }
        let entity = source
            .entity(entity_id)
            .ok_or_else(|| ValidationError::UnknownEntity(entity_id.clone()))?;
        let supported = entity.supported_features();
        if !supported.contains(required) {
            return Err(ValidationError::MissingCapabilities {
                entity_id: entity_id.clone(),
                missing: supported.missing(required),
            }
            .into());
        }
        entities.push(entity);
    }

    let mut responses = Map::new();
    for entity in &entities {
        if let Some(response) = handler.handle(CallTarget::Entity(entity.as_ref()), request)? {
            responses.insert(entity.entity_id().to_string(), response);
        }
    }
    Ok((!responses.is_empty()).then_some(Value::Object(responses)))
}

#[cfg(test)]
mod tests {
    use super::{register, unregister, RegisterOutcome, RegistrationError};
    use crate::capability::Capabilities;
    use crate::host::memory::{InMemoryHost, MemoryEntitySource, MemoryNumber};
    use crate::host::HostRegistry;
    use crate::service::call::{ServiceCall, ServiceRequest};
    use crate::service::descriptor::{ServiceDescriptor, ServiceKey};
    use crate::service::error::{ServiceError, ServiceResult, ValidationError};
    use crate::service::handler::{CallTarget, HandlerRef, ServiceHandler};
    use crate::EXTENSION_DOMAIN;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BLINK: Capabilities = Capabilities::from_bits(0b10);

    struct Probe {
        descriptor: ServiceDescriptor,
        hits: AtomicUsize,
    }

    impl Probe {
        fn handler(descriptor: ServiceDescriptor) -> Arc<Probe> {
            Arc::new(Self {
                descriptor,
                hits: AtomicUsize::new(0),
            })
        }
    }

    impl ServiceHandler for Probe {
        fn descriptor(&self) -> &ServiceDescriptor {
            &self.descriptor
        }

        fn handle(&self, target: CallTarget<'_>, _request: &ServiceRequest<'_>) -> ServiceResult {
            self.hits.fetch_add(1, Ordering::SeqCst);
            match target {
                CallTarget::Service => Ok(Some(Value::from("service"))),
                CallTarget::Entity(entity) => Ok(Some(Value::from(entity.entity_id()))),
            }
        }
    }

    fn lights() -> MemoryEntitySource {
        MemoryEntitySource::new()
            .with_entity(Arc::new(MemoryNumber::new("light.desk", 0.0).with_features(BLINK)))
            .with_entity(Arc::new(MemoryNumber::new("light.porch", 0.0)))
    }

    #[test]
    fn plain_service_skips_unloaded_foreign_domain() {
        let mut host = InMemoryHost::new();
        let probe: HandlerRef = Probe::handler(ServiceDescriptor::plain("greet", "hello"));
        let outcome = register(&mut host, &probe).expect("soft skip is not an error");
        assert_eq!(outcome, RegisterOutcome::Skipped);
        assert!(!host.has_registration(probe.descriptor().key()));
    }

    #[test]
    fn own_namespace_is_always_available() {
        let mut host = InMemoryHost::new();
        let probe: HandlerRef = Probe::handler(ServiceDescriptor::plain(EXTENSION_DOMAIN, "ping"));
        assert_eq!(
            register(&mut host, &probe).expect("register"),
            RegisterOutcome::Installed
        );
        let response = host
            .call(&ServiceCall::new(EXTENSION_DOMAIN, "ping"))
            .expect("call");
        assert_eq!(response, Some(Value::from("service")));

        unregister(&mut host, &probe);
        assert!(!host.has_registration(probe.descriptor().key()));
    }

    #[test]
    fn admin_service_reports_host_rejection() {
        let mut host = InMemoryHost::new().with_component("light").restrict_admin();
        let probe: HandlerRef = Probe::handler(ServiceDescriptor::admin("light", "turn_on"));
        assert_eq!(
            register(&mut host, &probe).expect("register"),
            RegisterOutcome::Rejected
        );
        assert!(!host.has_registration(probe.descriptor().key()));
    }

    #[test]
    fn entity_service_requires_loaded_platform() {
        let mut host = InMemoryHost::new().with_platform("light", "lifx", lights().into_handle());
        let probe: HandlerRef = Probe::handler(ServiceDescriptor::entity("light", "blink", "hue"));
        let err = register(&mut host, &probe).expect_err("platform must be loaded");
        assert_eq!(
            err,
            RegistrationError::PlatformNotFound {
                key: ServiceKey::new("light", "blink"),
                platform: "hue".to_string(),
            }
        );
    }

    #[test]
    fn entity_collection_requires_collection() {
        let mut host = InMemoryHost::new().with_component("number");
        let probe: HandlerRef =
            Probe::handler(ServiceDescriptor::entity_collection("number", "decrement"));
        let err = register(&mut host, &probe).expect_err("collection must exist");
        assert!(matches!(err, RegistrationError::CollectionNotFound(_)));
    }

    #[test]
    fn entity_call_is_gated_by_capabilities_before_dispatch() {
        let mut host = InMemoryHost::new().with_platform("light", "hue", lights().into_handle());
        let probe = Probe::handler(
            ServiceDescriptor::entity("light", "blink", "hue").with_required_capabilities(BLINK),
        );
        let handler: HandlerRef = probe.clone();
        register(&mut host, &handler).expect("register");

        let err = host
            .call(&ServiceCall::new("light", "blink").targeting(["light.desk", "light.porch"]))
            .expect_err("porch lacks blink");
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingCapabilities { ref entity_id, missing })
                if entity_id == "light.porch" && missing == BLINK
        ));
        assert_eq!(probe.hits.load(Ordering::SeqCst), 0);

        let response = host
            .call(&ServiceCall::new("light", "blink").targeting(["light.desk", "light.desk"]))
            .expect("desk supports blink");
        assert_eq!(response, Some(json!({"light.desk": "light.desk"})));
        assert_eq!(probe.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn entity_call_rejects_missing_or_unknown_targets() {
        let mut host = InMemoryHost::new().with_collection("light", lights().into_handle());
        let handler: HandlerRef =
            Probe::handler(ServiceDescriptor::entity_collection("light", "flash"));
        register(&mut host, &handler).expect("register");

        let err = host
            .call(&ServiceCall::new("light", "flash"))
            .expect_err("no target");
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingTarget)
        ));

        let err = host
            .call(&ServiceCall::new("light", "flash").targeting(["light.attic"]))
            .expect_err("unknown entity");
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::UnknownEntity(_))
        ));
    }
}
