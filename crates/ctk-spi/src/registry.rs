//! Registry of compiled-in IdP responders.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{SpiError, SpiResult};
use crate::responder::{GenericResponder, IdpResponder};

/// Responders by name.
///
/// Responders are registered at start-up and selected by the name given
/// in the configuration; there is no runtime plugin loading.
pub struct ResponderRegistry {
    responders: DashMap<&'static str, Arc<dyn IdpResponder>>,
    default: RwLock<&'static str>,
}

impl std::fmt::Debug for ResponderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponderRegistry")
            .field("responders", &self.names())
            .field("default", &*self.default.read())
            .finish()
    }
}

impl Default for ResponderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponderRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responders: DashMap::new(),
            default: RwLock::new(GenericResponder::NAME),
        }
    }

    /// Creates a registry holding the built-in responders.
    #[must_use]
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(GenericResponder);
        registry
    }

    /// Registers a responder under its own name, replacing any previous one.
    pub fn register<R>(&self, responder: R)
    where
        R: IdpResponder + 'static,
    {
        let name = responder.name();
        debug!(responder = name, "registered IdP responder");
        self.responders.insert(name, Arc::new(responder));
    }

    /// Sets the responder used when no name is configured.
    pub fn set_default(&self, name: &'static str) {
        *self.default.write() = name;
    }

    /// Looks a responder up by name.
    ///
    /// # Errors
    ///
    /// Returns [`SpiError::ResponderNotFound`] for an unknown name.
    pub fn get(&self, name: &str) -> SpiResult<Arc<dyn IdpResponder>> {
        self.responders
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SpiError::ResponderNotFound(name.to_string()))
    }

    /// Looks up `name`, or the default responder if `name` is blank.
    ///
    /// # Errors
    ///
    /// Returns [`SpiError::ResponderNotFound`] for an unknown name.
    pub fn resolve(&self, name: Option<&str>) -> SpiResult<Arc<dyn IdpResponder>> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.get(name),
            None => {
                let default = *self.default.read();
                self.get(default)
            }
        }
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.responders.iter().map(|entry| *entry.key()).collect();
        names.sort_unstable();
        names
    }

    /// Checks if a responder is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.responders.contains_key(name)
    }
}
