#![allow(dead_code)]

use ghostwire_core::host::entity::EntitySourceHandle;
use ghostwire_core::{
    CallTarget, HandlerRef, HostRegistry, InMemoryHost, ParamSchema, Registration,
    ServiceDescription, ServiceDescriptor, ServiceError, ServiceHandler, ServiceKey,
    ServiceRequest, ServiceResult,
};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Handler answering with a fixed reply and counting calls.
pub struct FixedHandler {
    descriptor: ServiceDescriptor,
    replacing: AtomicBool,
    reply: Option<&'static str>,
    fail: bool,
    pub hits: AtomicUsize,
}

impl FixedHandler {
    pub fn new(descriptor: ServiceDescriptor, reply: &'static str) -> Self {
        Self {
            descriptor,
            replacing: AtomicBool::new(false),
            reply: Some(reply),
            fail: false,
            hits: AtomicUsize::new(0),
        }
    }

    pub fn replacing(self) -> Self {
        self.replacing.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self.reply = None;
        self
    }

    pub fn set_replacing(&self, value: bool) {
        self.replacing.store(value, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl ServiceHandler for FixedHandler {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn is_replacing(&self) -> bool {
        self.replacing.load(Ordering::SeqCst)
    }

    fn handle(&self, _target: CallTarget<'_>, _request: &ServiceRequest<'_>) -> ServiceResult {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::handler(BodyFailure));
        }
        Ok(self.reply.map(Value::from))
    }
}

#[derive(Debug)]
pub struct BodyFailure;

impl Display for BodyFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler body failed")
    }
}

impl Error for BodyFailure {}

/// `greet.hello` taking `{name: string}` and answering `Hello, {name}!`.
pub struct GreetHandler {
    descriptor: ServiceDescriptor,
    pub hits: AtomicUsize,
}

impl GreetHandler {
    pub fn new() -> Self {
        Self {
            descriptor: ServiceDescriptor::plain("greet", "hello").with_schema(
                ParamSchema::new().field(ghostwire_core::FieldSpec::required(
                    "name",
                    ghostwire_core::ParamType::String,
                )),
            ),
            hits: AtomicUsize::new(0),
        }
    }
}

impl ServiceHandler for GreetHandler {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn handle(&self, _target: CallTarget<'_>, request: &ServiceRequest<'_>) -> ServiceResult {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let name = request.data.get_str("name").unwrap_or_default();
        Ok(Some(Value::from(format!("Hello, {name}!"))))
    }
}

pub fn shared<H: ServiceHandler + 'static>(handler: H) -> Arc<H> {
    Arc::new(handler)
}

/// Factory returning the same shared handler instance.
pub fn factory<H: ServiceHandler + 'static>(handler: &Arc<H>) -> impl Fn() -> HandlerRef + 'static {
    let handler = Arc::clone(handler);
    move || -> HandlerRef { handler.clone() }
}

pub fn echo_registration(reply: &'static str) -> Registration {
    Registration::new(None, move |_| Ok(Some(Value::from(reply))))
}

/// Host mutations observed through [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    Register(String),
    RegisterAdmin(String),
    Unregister(String),
    Pop(String),
    Set(String),
    SetDescription(String),
    ClearDescriptionCache,
}

impl HostOp {
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Register(key)
            | Self::RegisterAdmin(key)
            | Self::Unregister(key)
            | Self::Pop(key)
            | Self::Set(key)
            | Self::SetDescription(key) => Some(key),
            Self::ClearDescriptionCache => None,
        }
    }
}

/// In-memory host that records every mutation made through `HostRegistry`.
pub struct RecordingHost {
    pub inner: InMemoryHost,
    pub ops: Vec<HostOp>,
}

impl RecordingHost {
    pub fn new(inner: InMemoryHost) -> Self {
        Self {
            inner,
            ops: Vec::new(),
        }
    }

    pub fn ops_for(&self, key: &str) -> Vec<HostOp> {
        self.ops
            .iter()
            .filter(|op| op.key() == Some(key))
            .cloned()
            .collect()
    }
}

impl HostRegistry for RecordingHost {
    fn register(&mut self, key: &ServiceKey, registration: Registration) {
        self.ops.push(HostOp::Register(key.to_string()));
        self.inner.register(key, registration);
    }

    fn register_admin(&mut self, key: &ServiceKey, registration: Registration) -> bool {
        self.ops.push(HostOp::RegisterAdmin(key.to_string()));
        self.inner.register_admin(key, registration)
    }

    fn unregister(&mut self, key: &ServiceKey) {
        self.ops.push(HostOp::Unregister(key.to_string()));
        self.inner.unregister(key);
    }

    fn has_registration(&self, key: &ServiceKey) -> bool {
        self.inner.has_registration(key)
    }

    fn pop_registration(&mut self, key: &ServiceKey) -> Option<Registration> {
        self.ops.push(HostOp::Pop(key.to_string()));
        self.inner.pop_registration(key)
    }

    fn set_registration(&mut self, key: &ServiceKey, registration: Registration) {
        self.ops.push(HostOp::Set(key.to_string()));
        self.inner.set_registration(key, registration);
    }

    fn set_description(&mut self, key: &ServiceKey, description: ServiceDescription) {
        self.ops.push(HostOp::SetDescription(key.to_string()));
        self.inner.set_description(key, description);
    }

    fn clear_description_cache(&mut self) {
        self.ops.push(HostOp::ClearDescriptionCache);
        self.inner.clear_description_cache();
    }

    fn find_platform(&self, domain: &str, platform_id: &str) -> Option<EntitySourceHandle> {
        self.inner.find_platform(domain, platform_id)
    }

    fn find_collection(&self, domain: &str) -> Option<EntitySourceHandle> {
        self.inner.find_collection(domain)
    }

    fn is_component_loaded(&self, domain: &str) -> bool {
        self.inner.is_component_loaded(domain)
    }
}
