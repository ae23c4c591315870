//! Service contracts: descriptors, schemas, registrations and strategies.
//!
//! # Responsibility
//! - Describe one service and validate its calls.
//! - Turn a handler into a host routing entry according to its kind.

pub mod call;
pub mod catalog;
pub mod description;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod number;
pub mod registration;
pub mod schema;
pub mod strategy;
