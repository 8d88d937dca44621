//! # Keyed Stores
//!
//! The two tiers of module state live in independent stores keyed by module name:
//!
//! - [`LoadedModuleStore`] holds descriptors of loaded modules (the primary model).
//! - [`UnloadedEntityStore`] holds [`UnloadedModuleEntity`] values for unloaded modules.
//!
//! Both are instances of the generic [`KeyedStore`], an arena of slots plus a name index.
//! Keeping them apart means the unloaded tier can be read and persisted without touching
//! the heavier loaded model, and the two can never disagree about a single entry's flag.

mod keyed;

pub use keyed::KeyedStore;

use crate::model::{ModuleDescriptor, UnloadedModuleEntity};

/// Contract for values held in a [`KeyedStore`].
pub trait StoredEntity: Clone + Send + Sync + 'static {
    /// The unique key of this value.
    fn name(&self) -> &str;

    /// Re-keys the value in place. Called by [`KeyedStore::rename`].
    fn set_name(&mut self, name: String);
}

impl StoredEntity for ModuleDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl StoredEntity for UnloadedModuleEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Descriptors of loaded modules.
pub type LoadedModuleStore = KeyedStore<ModuleDescriptor>;

/// Entities of unloaded modules.
pub type UnloadedEntityStore = KeyedStore<UnloadedModuleEntity>;
