//! Host activation window.

use crate::host::HostRegistry;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

type UnloadHook = Box<dyn FnOnce(&mut dyn HostRegistry)>;

/// One activation of the extension; releases its resources on unload.
///
/// # Invariants
/// - Each hook runs at most once, in reverse order of registration.
pub struct ActivationContext {
    id: Uuid,
    hooks: Vec<UnloadHook>,
}

impl ActivationContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            hooks: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn on_unload<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut dyn HostRegistry) + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Runs and drains all unload hooks; returns how many ran.
    pub fn unload(&mut self, host: &mut dyn HostRegistry) -> usize {
        let hooks = std::mem::take(&mut self.hooks);
        let count = hooks.len();
        for hook in hooks.into_iter().rev() {
            hook(host);
        }
        count
    }
}

impl Default for ActivationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ActivationContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationContext")
            .field("id", &self.id)
            .field("pending_hooks", &self.hooks.len())
            .finish()
    }
}
