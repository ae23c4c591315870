//! Storage for host registrations superseded by replacing handlers.
//!
//! # Invariants
//! - One entry per key; a key is captured at most once per activation.
//! - Entries are consumed by `take` exactly once; leftovers after teardown
//!   are a defect reported by the manager.

use crate::service::descriptor::ServiceKey;
use crate::service::registration::Registration;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default)]
pub struct OverrideVault {
    entries: BTreeMap<ServiceKey, Registration>,
}

impl OverrideVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the registration that existed right before an override.
    pub fn capture(&mut self, key: ServiceKey, previous: Registration) -> Result<(), VaultError> {
        if self.entries.contains_key(&key) {
            return Err(VaultError::AlreadyCaptured(key));
        }
        self.entries.insert(key, previous);
        Ok(())
    }

    /// Removes and returns the captured registration for `key`.
    pub fn take(&mut self, key: &ServiceKey) -> Option<Registration> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the vault, returning every unconsumed entry in key order.
    pub fn drain(&mut self) -> Vec<(ServiceKey, Registration)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    AlreadyCaptured(ServiceKey),
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyCaptured(key) => write!(f, "override already captured for {key}"),
        }
    }
}

impl Error for VaultError {}

#[cfg(test)]
mod tests {
    use super::{OverrideVault, VaultError};
    use crate::service::descriptor::ServiceKey;
    use crate::service::registration::Registration;

    #[test]
    fn capture_then_take_consumes_entry() {
        let mut vault = OverrideVault::new();
        let key = ServiceKey::new("light", "turn_on");
        let previous = Registration::new(None, |_| Ok(None));
        let previous_id = previous.id();

        vault.capture(key.clone(), previous).expect("first capture");
        assert!(vault.contains(&key));
        assert_eq!(vault.take(&key).map(|r| r.id()), Some(previous_id));
        assert!(vault.take(&key).is_none());
        assert!(vault.is_empty());
    }

    #[test]
    fn rejects_second_capture_and_keeps_first() {
        let mut vault = OverrideVault::new();
        let key = ServiceKey::new("light", "turn_on");
        let first = Registration::new(None, |_| Ok(None));
        let first_id = first.id();
        vault.capture(key.clone(), first).expect("first capture");

        let err = vault
            .capture(key.clone(), Registration::new(None, |_| Ok(None)))
            .expect_err("second capture must fail");
        assert_eq!(err, VaultError::AlreadyCaptured(key.clone()));
        assert_eq!(vault.take(&key).map(|r| r.id()), Some(first_id));
    }

    #[test]
    fn drain_returns_leftovers_in_key_order() {
        let mut vault = OverrideVault::new();
        vault
            .capture(ServiceKey::new("switch", "toggle"), Registration::new(None, |_| Ok(None)))
            .expect("capture");
        vault
            .capture(ServiceKey::new("light", "toggle"), Registration::new(None, |_| Ok(None)))
            .expect("capture");

        let keys: Vec<String> = vault.drain().into_iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["light.toggle", "switch.toggle"]);
        assert_eq!(vault.len(), 0);
    }
}
