//! Packaged service descriptions.
//!
//! # Responsibility
//! - Parse the bundled `services.yaml` metadata keyed by `"{domain}_{service}"`.
//! - Provide advisory documentation for services installed into other domains.
//!
//! # Invariants
//! - The table is read-only once loaded.
//! - A missing or malformed table never fails setup; callers fall back to empty.

use crate::service::descriptor::ServiceKey;
use crate::service::schema::ParamSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BUNDLED_SERVICES_YAML: &str = include_str!("../../services.yaml");

/// Human-readable description of one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDescription>,
}

impl ServiceDescription {
    /// Minimal description derived from a call schema.
    pub fn from_schema(schema: Option<&ParamSchema>) -> Self {
        let fields = schema
            .map(|schema| {
                schema
                    .fields()
                    .iter()
                    .map(|field| {
                        (
                            field.name().to_string(),
                            FieldDescription {
                                required: field.is_required(),
                                ..FieldDescription::default()
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            fields,
            ..Self::default()
        }
    }
}

/// Human-readable description of one service field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub example: Option<Value>,
}

/// Description lookup table keyed by `"{domain}_{service}"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionTable {
    entries: BTreeMap<String, ServiceDescription>,
}

impl DescriptionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the table bundled with this crate.
    pub fn bundled() -> Result<Self, DescriptionError> {
        Self::from_yaml_str(BUNDLED_SERVICES_YAML)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, DescriptionError> {
        if raw.trim().is_empty() {
            return Ok(Self::empty());
        }
        let entries: Option<BTreeMap<String, ServiceDescription>> =
            serde_yaml::from_str(raw).map_err(DescriptionError::Parse)?;
        Ok(Self {
            entries: entries.unwrap_or_default(),
        })
    }

    pub fn insert(&mut self, key: &ServiceKey, description: ServiceDescription) {
        self.entries.insert(key.description_key(), description);
    }

    pub fn get(&self, key: &ServiceKey) -> Option<&ServiceDescription> {
        self.entries.get(&key.description_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub enum DescriptionError {
    Parse(serde_yaml::Error),
}

impl Display for DescriptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid service description table: {err}"),
        }
    }
}

impl Error for DescriptionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
        }
    }
}
