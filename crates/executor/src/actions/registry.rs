use std::collections::BTreeMap;
use std::sync::Arc;

use super::Action;
use crate::{Error, Result};

/// Explicit table of the actions a handler can run.
///
/// Built once at startup and passed by reference; names are unique.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under its own name
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateAction` if the name is taken.
    pub fn register(&mut self, action: impl Action + 'static) -> Result<()> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            return Err(Error::DuplicateAction { action: name });
        }
        self.actions.insert(name, Arc::new(action));
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, action: impl Action + 'static) -> Result<Self> {
        self.register(action)?;
        Ok(self)
    }

    /// Look up an action
    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(|action| action.as_ref())
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is registered
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
