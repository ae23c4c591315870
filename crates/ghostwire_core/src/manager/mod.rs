//! Activation-scoped orchestration of extension services.

pub mod context;
pub mod error;
pub mod service_manager;
pub mod vault;
