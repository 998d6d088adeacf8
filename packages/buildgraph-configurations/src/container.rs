//! Configuration containers and providers

use crate::configuration::Configuration;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Supplies the set of sibling configurations visible to a resolution.
pub trait ConfigurationsProvider: Send + Sync {
    fn all(&self) -> Vec<Arc<Configuration>>;

    fn find_by_name(&self, name: &str) -> Option<Arc<Configuration>>;
}

/// Name-indexed configuration container owned by a project.
#[derive(Default)]
pub struct ConfigurationContainer {
    by_name: DashMap<String, Arc<Configuration>>,
    ordered: Mutex<Vec<Arc<Configuration>>>,
}

impl ConfigurationContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration. Returns false when the name is taken.
    pub fn add(&self, configuration: Arc<Configuration>) -> bool {
        let name = configuration.name().to_string();
        if self.by_name.contains_key(&name) {
            return false;
        }
        self.by_name.insert(name, Arc::clone(&configuration));
        self.ordered.lock().push(configuration);
        true
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl ConfigurationsProvider for ConfigurationContainer {
    fn all(&self) -> Vec<Arc<Configuration>> {
        self.ordered.lock().clone()
    }

    fn find_by_name(&self, name: &str) -> Option<Arc<Configuration>> {
        self.by_name.get(name).map(|entry| Arc::clone(entry.value()))
    }
}

/// Provider for a detached copy: the copy is its only configuration, so it
/// resolves in isolation.
#[derive(Default)]
pub struct DetachedConfigurationsProvider {
    configuration: Mutex<Option<Arc<Configuration>>>,
}

impl DetachedConfigurationsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_configuration(&self, configuration: Arc<Configuration>) {
        *self.configuration.lock() = Some(configuration);
    }
}

impl ConfigurationsProvider for DetachedConfigurationsProvider {
    fn all(&self) -> Vec<Arc<Configuration>> {
        self.configuration.lock().iter().cloned().collect()
    }

    fn find_by_name(&self, name: &str) -> Option<Arc<Configuration>> {
        self.configuration
            .lock()
            .as_ref()
            .filter(|c| c.name() == name)
            .cloned()
    }
}
