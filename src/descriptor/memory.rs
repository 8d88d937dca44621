use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::{DescriptorError, DescriptorReader};
use crate::clients::ChangeSink;
use crate::model::{ModuleDescriptor, ModuleSetChange};

#[derive(Default)]
struct Inner {
    modules: BTreeMap<String, ModuleDescriptor>,
    failing: BTreeSet<String>,
    sinks: Vec<ChangeSink>,
}

/// A thread-safe, in-memory module configuration.
///
/// Mutations that correspond to configuration events (`discover`, `create_directly`,
/// `remove`, `rename`) update the descriptors first and then publish the matching
/// [`ModuleSetChange`] to every subscribed [`ChangeSink`], so by the time a project sees
/// an event the descriptor it refers to is readable.
///
/// # Example
/// ```ignore
/// let reader = InMemoryDescriptors::with_modules([
///     ModuleDescriptor::new("a"),
///     ModuleDescriptor::new("b").with_module_dependency("a"),
/// ]);
/// reader.subscribe(session.client.change_sink());
/// reader.discover(ModuleDescriptor::new("c"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDescriptors {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules(modules: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        let reader = Self::new();
        for module in modules {
            reader.insert(module);
        }
        reader
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers future change events to `sink`.
    pub fn subscribe(&self, sink: ChangeSink) {
        self.lock().sinks.push(sink);
    }

    fn publish(inner: &mut Inner, change: ModuleSetChange) {
        debug!(%change, sinks = inner.sinks.len(), "Publishing module set change");
        inner.sinks.retain(|sink| sink.publish(change.clone()));
    }

    /// Adds or replaces a descriptor without emitting an event.
    pub fn insert(&self, descriptor: ModuleDescriptor) {
        self.lock().modules.insert(descriptor.name.clone(), descriptor);
    }

    /// Adds a descriptor found by re-reading configuration.
    pub fn discover(&self, descriptor: ModuleDescriptor) {
        let mut inner = self.lock();
        let name = descriptor.name.clone();
        inner.modules.insert(name.clone(), descriptor);
        Self::publish(&mut inner, ModuleSetChange::Added(name));
    }

    /// Adds a descriptor through an explicit "create module" operation.
    pub fn create_directly(&self, descriptor: ModuleDescriptor) {
        let mut inner = self.lock();
        let name = descriptor.name.clone();
        inner.modules.insert(name.clone(), descriptor);
        Self::publish(&mut inner, ModuleSetChange::CreatedDirectly(name));
    }

    /// Deletes a descriptor. Returns `false` if it did not exist.
    pub fn remove(&self, name: &str) -> bool {
        let mut inner = self.lock();
        if inner.modules.remove(name).is_none() {
            return false;
        }
        Self::publish(&mut inner, ModuleSetChange::Removed(name.to_owned()));
        true
    }

    /// Renames a descriptor in place. Returns `false` if `old_name` did not exist.
    pub fn rename(&self, old_name: &str, new_name: &str) -> bool {
        let mut inner = self.lock();
        let Some(mut descriptor) = inner.modules.remove(old_name) else {
            return false;
        };
        descriptor.name = new_name.to_owned();
        inner.modules.insert(new_name.to_owned(), descriptor);
        Self::publish(&mut inner, ModuleSetChange::renamed(old_name, new_name));
        true
    }

    /// Makes every subsequent read of `name` fail with [`DescriptorError::Malformed`].
    pub fn fail_reads_for(&self, name: impl Into<String>) {
        self.lock().failing.insert(name.into());
    }

    pub fn clear_failure(&self, name: &str) {
        self.lock().failing.remove(name);
    }
}

#[async_trait]
impl DescriptorReader for InMemoryDescriptors {
    async fn list_known_module_names(&self) -> Result<BTreeSet<String>, DescriptorError> {
        Ok(self.lock().modules.keys().cloned().collect())
    }

    async fn read_descriptor(&self, name: &str) -> Result<ModuleDescriptor, DescriptorError> {
        let inner = self.lock();
        if inner.failing.contains(name) {
            return Err(DescriptorError::Malformed {
                name: name.to_owned(),
                reason: "injected read failure".to_owned(),
            });
        }
        inner
            .modules
            .get(name)
            .cloned()
            .ok_or_else(|| DescriptorError::NotFound(name.to_owned()))
    }
}
