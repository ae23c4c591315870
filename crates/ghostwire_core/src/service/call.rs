//! Service call envelopes.

use crate::service::descriptor::ServiceKey;
use crate::service::schema::ServiceData;
use serde_json::Value;

/// Caller identity attached to a service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl CallContext {
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin: true,
        }
    }
}

/// Raw service call as received from the host dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub key: ServiceKey,
    pub data: Value,
    /// Target entity ids for entity-targeted services.
    pub target: Vec<String>,
    pub context: CallContext,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            key: ServiceKey::new(domain, service),
            data: Value::Null,
            target: Vec::new(),
            context: CallContext::default(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn targeting<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = entity_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }
}

/// Validated call handed to a routing entry and its handler.
#[derive(Debug)]
pub struct ServiceRequest<'a> {
    pub key: &'a ServiceKey,
    pub data: ServiceData,
    pub target: &'a [String],
    pub context: &'a CallContext,
}
