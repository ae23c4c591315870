//! Explicit handler catalog.
//!
//! # Invariants
//! - Unit names are unique.
//! - Handlers are instantiated in ascending unit-name order.

use crate::service::handler::HandlerRef;
use crate::service::number;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

type HandlerFactory = Box<dyn Fn() -> HandlerRef>;

const BUILTIN_UNITS: &[(&str, fn() -> HandlerRef)] = &[
    ("number_decrement", number::decrement),
    ("number_increment", number::increment),
];

/// Unit name to handler constructor table.
#[derive(Default)]
pub struct ServiceCatalog {
    factories: BTreeMap<String, HandlerFactory>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the services bundled with this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (unit, factory) in BUILTIN_UNITS {
            catalog.factories.insert((*unit).to_string(), Box::new(*factory));
        }
        catalog
    }

    /// Adds one unit; names must be unique within the catalog.
    pub fn register<F>(&mut self, unit: impl Into<String>, factory: F) -> Result<(), CatalogError>
    where
        F: Fn() -> HandlerRef + 'static,
    {
        let unit = unit.into();
        if self.factories.contains_key(&unit) {
            return Err(CatalogError::DuplicateUnit(unit));
        }
        self.factories.insert(unit, Box::new(factory));
        Ok(())
    }

    pub fn with<F>(mut self, unit: impl Into<String>, factory: F) -> Result<Self, CatalogError>
    where
        F: Fn() -> HandlerRef + 'static,
    {
        self.register(unit, factory)?;
        Ok(self)
    }

    pub fn units(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Constructs one handler per unit, in sorted unit order.
    pub fn instantiate(&self) -> Vec<HandlerRef> {
        self.factories.values().map(|factory| factory()).collect()
    }
}

impl Debug for ServiceCatalog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("units", &self.units())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateUnit(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateUnit(unit) => write!(f, "service unit already registered: {unit}"),
        }
    }
}

impl Error for CatalogError {}
