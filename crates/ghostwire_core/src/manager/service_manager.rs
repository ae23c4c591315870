//! Service registration/override manager.
//!
//! # Responsibility
//! - Install every catalog handler into the live host on activation.
//! - Capture registrations that replacing handlers supersede, and restore them
//!   on teardown.
//! - Inject packaged descriptions for services installed into foreign domains.
//!
//! # Invariants
//! - Active keys are unique.
//! - Capture and registration of one key happen under a single `&mut` host
//!   borrow; no call can observe the key absent in between.
//! - Teardown runs in reverse registration order and leaves the vault empty.
//! - A failed setup leaves nothing from its pass registered.

use crate::host::HostRegistry;
use crate::manager::context::ActivationContext;
use crate::manager::error::SetupError;
use crate::manager::vault::OverrideVault;
use crate::service::catalog::ServiceCatalog;
use crate::service::description::DescriptionTable;
use crate::service::descriptor::ServiceKey;
use crate::service::handler::HandlerRef;
use crate::service::strategy::{self, RegisterOutcome};
use crate::EXTENSION_DOMAIN;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Outcome of one teardown pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Keys unregistered, in teardown order.
    pub unregistered: Vec<ServiceKey>,
    /// Keys whose previous registration was put back.
    pub restored: Vec<ServiceKey>,
    /// Vault entries no active handler consumed.
    pub leaked: Vec<ServiceKey>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.leaked.is_empty()
    }
}

#[derive(Default)]
struct ManagerState {
    active: Vec<HandlerRef>,
    active_keys: BTreeSet<ServiceKey>,
    vault: OverrideVault,
    descriptions: DescriptionTable,
}

impl ManagerState {
    fn admit(&self, handler: &HandlerRef) -> Result<ServiceKey, SetupError> {
        let descriptor = handler.descriptor();
        let key = descriptor.key().clone();
        descriptor
            .validate()
            .map_err(|source| SetupError::InvalidDescriptor {
                key: key.clone(),
                source,
            })?;
        if self.active_keys.contains(&key) {
            return Err(SetupError::DuplicateService(key));
        }
        Ok(key)
    }

    fn capture_override(
        &mut self,
        host: &mut dyn HostRegistry,
        key: &ServiceKey,
    ) -> Result<(), SetupError> {
        if self.vault.contains(key) {
            return Err(SetupError::AlreadyCaptured(key.clone()));
        }
        if !host.has_registration(key) {
            return Ok(());
        }
        if let Some(previous) = host.pop_registration(key) {
            debug!(
                "event=override_capture module=services status=ok key={key} registration={}",
                previous.id()
            );
            self.vault.capture(key.clone(), previous)?;
        }
        Ok(())
    }

    fn register_service(
        &mut self,
        host: &mut dyn HostRegistry,
        handler: HandlerRef,
    ) -> Result<RegisterOutcome, SetupError> {
        let key = handler.descriptor().key().clone();
        let outcome = match strategy::register(host, &handler) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.restore_captured(host, &key);
                return Err(err.into());
            }
        };
        if !outcome.is_installed() {
            self.restore_captured(host, &key);
            return Ok(outcome);
        }

        self.active_keys.insert(key.clone());
        self.active.push(handler);

        if key.domain != EXTENSION_DOMAIN {
            if let Some(description) = self.descriptions.get(&key) {
                debug!("event=description_inject module=services status=ok key={key}");
                host.set_description(&key, description.clone());
            }
        }
        Ok(outcome)
    }

    fn restore_captured(&mut self, host: &mut dyn HostRegistry, key: &ServiceKey) -> bool {
        let Some(previous) = self.vault.take(key) else {
            return false;
        };
        debug!(
            "event=override_restore module=services status=ok key={key} registration={}",
            previous.id()
        );
        host.set_registration(key, previous);
        host.clear_description_cache();
        true
    }

    fn teardown(&mut self, host: &mut dyn HostRegistry) -> TeardownReport {
        let mut report = TeardownReport::default();
        let active = std::mem::take(&mut self.active);
        self.active_keys.clear();

        for handler in active.iter().rev() {
            let key = handler.descriptor().key();
            strategy::unregister(host, handler);
            report.unregistered.push(key.clone());

            if handler.is_replacing() && self.restore_captured(host, key) {
                report.restored.push(key.clone());
            }
        }

        for (key, previous) in self.vault.drain() {
            error!(
                "event=teardown_inconsistency module=services status=error key={key} reason=unconsumed_override"
            );
            host.set_registration(&key, previous);
            host.clear_description_cache();
            report.leaked.push(key);
        }

        info!(
            "event=services_teardown module=services status={} unregistered={} restored={} leaked={}",
            if report.is_clean() { "ok" } else { "error" },
            report.unregistered.len(),
            report.restored.len(),
            report.leaked.len()
        );
        report
    }
}

/// Installs extension services into a host for one activation.
pub struct ServiceManager {
    catalog: ServiceCatalog,
    descriptions: Option<DescriptionTable>,
    state: Rc<RefCell<ManagerState>>,
}

impl ServiceManager {
    pub fn new(catalog: ServiceCatalog) -> Self {
        debug!(
            "event=manager_init module=services status=ok units={}",
            catalog.len()
        );
        Self {
            catalog,
            descriptions: None,
            state: Rc::new(RefCell::new(ManagerState::default())),
        }
    }

    pub fn with_builtin_catalog() -> Self {
        Self::new(ServiceCatalog::builtin())
    }

    /// Uses `table` instead of the bundled description table.
    pub fn with_descriptions(mut self, table: DescriptionTable) -> Self {
        self.descriptions = Some(table);
        self
    }

    /// Installs every catalog handler and arms teardown on `context` unload.
    ///
    /// # Errors
    /// - Returns the first setup error; handlers installed earlier in this pass
    ///   are rolled back before returning.
    pub fn setup(
        &self,
        host: &mut dyn HostRegistry,
        context: &mut ActivationContext,
    ) -> Result<(), SetupError> {
        info!(
            "event=services_setup module=services status=start context={}",
            context.id()
        );

        let state = Rc::clone(&self.state);
        context.on_unload(move |host| {
            state.borrow_mut().teardown(host);
        });

        self.state.borrow_mut().descriptions = self.load_descriptions();

        for handler in self.catalog.instantiate() {
            if let Err(err) = self.install(host, handler) {
                error!(
                    "event=services_setup module=services status=error key={} error={err}",
                    err.key()
                );
                self.state.borrow_mut().teardown(host);
                return Err(err);
            }
        }

        info!(
            "event=services_setup module=services status=ok context={} active={}",
            context.id(),
            self.state.borrow().active.len()
        );
        Ok(())
    }

    /// Registers one handler outside the catalog pass.
    ///
    /// No override capture happens here; use a catalog unit for replacing
    /// handlers.
    pub fn register_service(
        &self,
        host: &mut dyn HostRegistry,
        handler: HandlerRef,
    ) -> Result<RegisterOutcome, SetupError> {
        let mut state = self.state.borrow_mut();
        state.admit(&handler)?;
        state.register_service(host, handler)
    }

    /// Unregisters every active handler and restores captured registrations.
    pub fn teardown(&self, host: &mut dyn HostRegistry) -> TeardownReport {
        self.state.borrow_mut().teardown(host)
    }

    /// Active keys in registration order.
    pub fn active_keys(&self) -> Vec<ServiceKey> {
        self.state
            .borrow()
            .active
            .iter()
            .map(|handler| handler.descriptor().key().clone())
            .collect()
    }

    pub fn is_active(&self, key: &ServiceKey) -> bool {
        self.state.borrow().active_keys.contains(key)
    }

    /// Keys whose previous registration is currently held in the vault.
    pub fn captured_keys(&self) -> Vec<ServiceKey> {
        self.state.borrow().vault.keys()
    }

    fn install(&self, host: &mut dyn HostRegistry, handler: HandlerRef) -> Result<(), SetupError> {
        let mut state = self.state.borrow_mut();
        let key = state.admit(&handler)?;
        if handler.is_replacing() {
            state.capture_override(host, &key)?;
        }
        state.register_service(host, handler)?;
        Ok(())
    }

    fn load_descriptions(&self) -> DescriptionTable {
        if let Some(table) = &self.descriptions {
            return table.clone();
        }
        match DescriptionTable::bundled() {
            Ok(table) => table,
            Err(err) => {
                warn!("event=descriptions_load module=services status=skip error={err}");
                DescriptionTable::empty()
            }
        }
    }
}
