//! Builtin `number.decrement` / `number.increment` entity services.

use crate::service::call::ServiceRequest;
use crate::service::descriptor::ServiceDescriptor;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::handler::{CallTarget, HandlerRef, ServiceHandler};
use crate::service::schema::{FieldSpec, ParamSchema, ParamType};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const NUMBER_DOMAIN: &str = "number";
const STEP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepDirection {
    Down,
    Up,
}

/// Moves a number entity by a whole number of steps, clamped to its range.
pub struct NumberStepService {
    descriptor: ServiceDescriptor,
    direction: StepDirection,
}

impl NumberStepService {
    fn new(service: &str, direction: StepDirection) -> Self {
        let schema =
            ParamSchema::new().field(FieldSpec::optional("amount", ParamType::Float).coerce());
        Self {
            descriptor: ServiceDescriptor::entity_collection(NUMBER_DOMAIN, service)
                .with_schema(schema),
            direction,
        }
    }
}

pub fn decrement() -> HandlerRef {
    Arc::new(NumberStepService::new("decrement", StepDirection::Down))
}

pub fn increment() -> HandlerRef {
    Arc::new(NumberStepService::new("increment", StepDirection::Up))
}

impl ServiceHandler for NumberStepService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    fn handle(&self, target: CallTarget<'_>, request: &ServiceRequest<'_>) -> ServiceResult {
        let CallTarget::Entity(entity) = target else {
            return Err(ServiceError::handler(NumberServiceError::MissingEntity));
        };
        let entity_id = entity.entity_id();
        let number = entity
            .as_number()
            .ok_or_else(|| ServiceError::handler(NumberServiceError::NotANumber(entity_id.to_string())))?;

        let step = if number.step() > 0.0 { number.step() } else { 1.0 };
        let amount = request.data.get_f64("amount").unwrap_or(step);
        if !is_multiple_of(amount, step) {
            return Err(ServiceError::handler(NumberServiceError::InvalidAmount {
                entity_id: entity_id.to_string(),
                amount,
                step,
            }));
        }

        let current = number.native_value().ok_or_else(|| {
            ServiceError::handler(NumberServiceError::UnknownValue(entity_id.to_string()))
        })?;
        let value = match self.direction {
            StepDirection::Down => {
                let value = current - amount;
                number.min_value().map_or(value, |min| value.max(min))
            }
            StepDirection::Up => {
                let value = current + amount;
                number.max_value().map_or(value, |max| value.min(max))
            }
        };

        number.set_native_value(value)?;
        Ok(None)
    }
}

fn is_multiple_of(amount: f64, step: f64) -> bool {
    let ratio = amount / step;
    (ratio - ratio.round()).abs() < STEP_TOLERANCE
}

/// Number service runtime failures.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberServiceError {
    MissingEntity,
    NotANumber(String),
    UnknownValue(String),
    InvalidAmount {
        entity_id: String,
        amount: f64,
        step: f64,
    },
}

impl Display for NumberServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntity => write!(f, "number service requires a target entity"),
            Self::NotANumber(entity_id) => write!(f, "{entity_id} is not a number entity"),
            Self::UnknownValue(entity_id) => write!(f, "{entity_id} has no current value"),
            Self::InvalidAmount {
                entity_id,
                amount,
                step,
            } => write!(
                f,
                "Amount {amount} not valid for {entity_id}, it needs to be a multiple of {step}"
            ),
        }
    }
}

impl Error for NumberServiceError {}

#[cfg(test)]
mod tests {
    use super::{decrement, increment, is_multiple_of, NumberServiceError};
    use crate::host::memory::{InMemoryHost, MemoryEntitySource, MemoryNumber};
    use crate::service::call::ServiceCall;
    use crate::service::error::ServiceError;
    use crate::service::strategy::register;
    use serde_json::json;
    use std::sync::Arc;

    fn host_with(number: Arc<MemoryNumber>) -> InMemoryHost {
        let mut host = InMemoryHost::new()
            .with_collection("number", MemoryEntitySource::new().with_entity(number).into_handle());
        register(&mut host, &decrement()).expect("decrement registers");
        register(&mut host, &increment()).expect("increment registers");
        host
    }

    #[test]
    fn decrements_by_one_step_by_default() {
        let number = Arc::new(MemoryNumber::new("number.volume", 10.0).with_step(2.0));
        let host = host_with(Arc::clone(&number));
        host.call(&ServiceCall::new("number", "decrement").targeting(["number.volume"]))
            .expect("decrement");
        assert_eq!(number.value(), Some(8.0));
    }

    #[test]
    fn clamps_to_range() {
        let number = Arc::new(MemoryNumber::new("number.volume", 3.0).with_range(0.0, 5.0));
        let host = host_with(Arc::clone(&number));

        host.call(
            &ServiceCall::new("number", "decrement")
                .with_data(json!({"amount": "4"}))
                .targeting(["number.volume"]),
        )
        .expect("decrement with coerced amount");
        assert_eq!(number.value(), Some(0.0));

        host.call(
            &ServiceCall::new("number", "increment")
                .with_data(json!({"amount": 9}))
                .targeting(["number.volume"]),
        )
        .expect("increment");
        assert_eq!(number.value(), Some(5.0));
    }

    #[test]
    fn rejects_amount_that_is_not_a_step_multiple() {
        let number = Arc::new(MemoryNumber::new("number.volume", 10.0).with_step(0.5));
        let host = host_with(Arc::clone(&number));
        let err = host
            .call(
                &ServiceCall::new("number", "increment")
                    .with_data(json!({"amount": 0.75}))
                    .targeting(["number.volume"]),
            )
            .expect_err("0.75 is not a multiple of 0.5");
        let ServiceError::Handler(inner) = err else {
            panic!("expected handler error");
        };
        assert!(matches!(
            inner.downcast_ref::<NumberServiceError>(),
            Some(NumberServiceError::InvalidAmount { .. })
        ));
        assert_eq!(number.value(), Some(10.0));
    }

    #[test]
    fn unknown_value_is_a_handler_error() {
        let number = Arc::new(MemoryNumber::unknown("number.volume"));
        let host = host_with(number);
        let err = host
            .call(&ServiceCall::new("number", "decrement").targeting(["number.volume"]))
            .expect_err("no value to decrement");
        assert!(matches!(err, ServiceError::Handler(_)));
    }

    #[test]
    fn step_multiples_tolerate_float_error() {
        assert!(is_multiple_of(0.3, 0.1));
        assert!(is_multiple_of(-2.0, 0.5));
        assert!(!is_multiple_of(0.25, 0.1));
    }
}
