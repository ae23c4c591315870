//! Call parameter schemas.
//!
//! # Invariants
//! - Keys not declared by the schema are rejected.
//! - Declared defaults fill absent optional fields.
//! - Coercion only applies to fields that opt into it.

use crate::service::error::ValidationError;
use serde_json::{Map, Number, Value};

/// Declared type of one call parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    Any,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Any => "any",
        }
    }
}

/// One accepted call parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    param_type: ParamType,
    required: bool,
    coerce: bool,
    default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            coerce: false,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type)
        }
    }

    /// Converts compatible strings/numbers into the declared type.
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn check(&self, value: &Value) -> Result<Value, ValidationError> {
        self.convert(value)
            .ok_or_else(|| ValidationError::InvalidType {
                field: self.name.clone(),
                expected: self.param_type,
            })
    }

    fn convert(&self, value: &Value) -> Option<Value> {
        match (self.param_type, value) {
            (ParamType::Any, value) => return Some(value.clone()),
            (ParamType::String, Value::String(_)) | (ParamType::Boolean, Value::Bool(_)) => {
                return Some(value.clone());
            }
            (ParamType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                return Some(value.clone());
            }
            (ParamType::Float, Value::Number(n)) => return n.as_f64().map(Value::from),
            _ => {}
        }
        if !self.coerce {
            return None;
        }

        match (self.param_type, value) {
            (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ParamType::Integer, Value::Number(n)) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Value::from(f as i64)),
            (ParamType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (ParamType::Boolean, Value::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" | "1" => Some(Value::Bool(true)),
                    "false" | "off" | "no" | "0" => Some(Value::Bool(false)),
                    _ => None,
                }
            }
            (ParamType::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Ordered set of accepted call parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|existing| existing.name != spec.name);
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validates one call payload and returns the normalized data.
    pub fn validate(&self, payload: &Value) -> Result<ServiceData, ValidationError> {
        let empty = Map::new();
        let object = payload_object(payload, &empty)?;

        if let Some(unknown) = object
            .keys()
            .find(|key| !self.fields.iter().any(|field| &field.name == *key))
        {
            return Err(ValidationError::UnexpectedField(unknown.clone()));
        }

        let mut values = Map::new();
        for field in &self.fields {
            match object.get(&field.name) {
                Some(value) => {
                    values.insert(field.name.clone(), field.check(value)?);
                }
                None => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        return Err(ValidationError::MissingField(field.name.clone()));
                    }
                }
            }
        }
        Ok(ServiceData(values))
    }

    /// Validation used when a service declares no schema: any key is rejected.
    pub fn validate_empty(payload: &Value) -> Result<ServiceData, ValidationError> {
        let empty = Map::new();
        let object = payload_object(payload, &empty)?;
        match object.keys().next() {
            Some(key) => Err(ValidationError::UnexpectedField(key.clone())),
            None => Ok(ServiceData::default()),
        }
    }
}

fn payload_object<'a>(
    payload: &'a Value,
    empty: &'a Map<String, Value>,
) -> Result<&'a Map<String, Value>, ValidationError> {
    match payload {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(empty),
        _ => Err(ValidationError::NotAnObject),
    }
}

/// Call parameters after schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceData(Map<String, Value>);

impl ServiceData {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
