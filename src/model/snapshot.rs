use std::collections::BTreeSet;

use super::entity::UnloadedModuleEntity;
use super::partition::ModulePartition;

/// An immutable, published view of one project's unload state.
///
/// The project actor replaces the whole snapshot after each completed mutation, so a
/// reader holding one never observes a half-applied recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnloadSnapshot {
    /// Whether an explicit unload request was ever made for this project.
    pub activated: bool,
    /// Bumped on every applied mutation.
    pub generation: u64,
    pub partition: ModulePartition,
    /// Sorted by name.
    pub unloaded_entities: Vec<UnloadedModuleEntity>,
}

impl UnloadSnapshot {
    /// The auto-managed loaded names; empty until the engine has been activated.
    pub fn loaded_modules(&self) -> BTreeSet<String> {
        if self.activated {
            self.partition.loaded.clone()
        } else {
            BTreeSet::new()
        }
    }

    pub fn unloaded_entity(&self, name: &str) -> Option<&UnloadedModuleEntity> {
        self.unloaded_entities
            .binary_search_by(|entity| entity.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.unloaded_entities[index])
    }
}
