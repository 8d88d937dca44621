//! The project's two-tier unload state, owned exclusively by the [`ProjectActor`].
//!
//! Every `apply_*` method is one atomic mutation: it moves modules between the tiers,
//! bumps the generation and reports what changed as a [`ModuleSetDelta`].
//!
//! [`ProjectActor`]: super::ProjectActor

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::model::{
    ModuleDescriptor, ModulePartition, ModuleSetDelta, UnloadSnapshot, UnloadedModuleEntity,
};
use crate::persistence::{LoadedModulesDocument, PersistedProject};
use crate::reachability::{self, DependencyGraph};
use crate::store::{LoadedModuleStore, UnloadedEntityStore};

#[derive(Debug, Default)]
pub struct UnloadState {
    activated: bool,
    generation: u64,
    loaded: LoadedModuleStore,
    unloaded: UnloadedEntityStore,
}

impl UnloadState {
    /// An inert project where every descriptor is loaded.
    pub fn new(descriptors: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        Self::restored(false, descriptors, Vec::new())
    }

    /// Rebuilds state from persisted tiers. A name present in both tiers stays loaded.
    pub fn restored(
        activated: bool,
        descriptors: impl IntoIterator<Item = ModuleDescriptor>,
        entities: impl IntoIterator<Item = UnloadedModuleEntity>,
    ) -> Self {
        let mut state = Self::default();
        for descriptor in descriptors {
            state.loaded.put(descriptor);
        }
        for entity in entities {
            if state.loaded.contains(&entity.name) {
                warn!(module = %entity.name, "Discarding unloaded entity for a loaded module");
                continue;
            }
            state.unloaded.put(entity);
        }
        state.activated = activated;
        state
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn knows(&self, name: &str) -> bool {
        self.loaded.contains(name) || self.unloaded.contains(name)
    }

    pub fn partition(&self) -> ModulePartition {
        ModulePartition {
            loaded: self.loaded.names(),
            unloaded: self.unloaded.names(),
        }
    }

    pub fn loaded_names(&self) -> BTreeSet<String> {
        self.loaded.names()
    }

    /// Edges of loaded modules restricted to targets in `targets`.
    pub fn loaded_edges_into(&self, targets: &BTreeSet<String>) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for descriptor in self.loaded.iter() {
            let edges: Vec<String> = descriptor
                .module_dependency_names()
                .filter(|target| targets.contains(*target))
                .map(str::to_owned)
                .collect();
            if !edges.is_empty() {
                graph.insert_edges(descriptor.name.clone(), edges);
            }
        }
        graph
    }

    pub fn snapshot(&self) -> UnloadSnapshot {
        UnloadSnapshot {
            activated: self.activated,
            generation: self.generation,
            partition: self.partition(),
            unloaded_entities: self.unloaded.all_entities(),
        }
    }

    pub fn persisted(&self) -> PersistedProject {
        let loaded_modules = if self.activated {
            self.loaded.names()
        } else {
            BTreeSet::new()
        };
        PersistedProject {
            loaded: LoadedModulesDocument {
                activated: self.activated,
                loaded_modules,
            },
            unloaded: self.unloaded.all_entities(),
        }
    }

    fn touch(&mut self, before: &ModulePartition) -> ModuleSetDelta {
        self.generation += 1;
        ModuleSetDelta::between(before, &self.partition())
    }

    /// Full-replace recomputation for an explicit request.
    ///
    /// `discovered` are pending modules not yet placed; they take part as ordinary known
    /// modules. Requested names that are not known are ignored.
    pub fn apply_full_replace(
        &mut self,
        requested: &BTreeSet<String>,
        discovered: Vec<ModuleDescriptor>,
    ) -> ModuleSetDelta {
        let before = self.partition();
        for descriptor in discovered {
            self.unloaded.remove(&descriptor.name);
            self.loaded.put(descriptor);
        }

        let known: BTreeSet<String> = self
            .loaded
            .names()
            .union(&self.unloaded.names())
            .cloned()
            .collect();
        let requested: BTreeSet<String> = requested.intersection(&known).cloned().collect();
        let mut graph = DependencyGraph::from_descriptors(self.loaded.iter());
        for entity in self.unloaded.iter() {
            graph.insert_entity(entity);
        }

        let partition = reachability::full_replace(&known, &graph, &requested);
        for name in &partition.unloaded {
            if let Some(descriptor) = self.loaded.remove(name) {
                self.unloaded.put(UnloadedModuleEntity::from(descriptor));
            }
        }
        for name in &partition.loaded {
            if let Some(entity) = self.unloaded.remove(name) {
                self.loaded.put(entity.into_descriptor());
            }
        }
        // only a request naming no known module makes the engine inert again
        self.activated = !partition.unloaded.is_empty();
        info!(
            requested = requested.len(),
            loaded = partition.loaded.len(),
            unloaded = partition.unloaded.len(),
            activated = self.activated,
            "Applied explicit unload request"
        );
        self.touch(&before)
    }

    /// Places discovered modules. `None` loads every one of them (inert engine).
    pub fn apply_discovered(
        &mut self,
        placement: Option<&ModulePartition>,
        descriptors: Vec<ModuleDescriptor>,
    ) -> ModuleSetDelta {
        let before = self.partition();
        for descriptor in descriptors {
            if self.knows(&descriptor.name) {
                debug!(module = %descriptor.name, "Discovered module is already placed");
                continue;
            }
            match placement {
                Some(placement) if !placement.is_loaded(&descriptor.name) => {
                    self.unloaded.put(UnloadedModuleEntity::from(descriptor));
                }
                _ => {
                    self.loaded.put(descriptor);
                }
            }
        }
        self.touch(&before)
    }

    /// A directly created module is always loaded and replaces any entity of the same name.
    pub fn apply_created_directly(&mut self, descriptor: ModuleDescriptor) -> ModuleSetDelta {
        let before = self.partition();
        if self.unloaded.remove(&descriptor.name).is_some() {
            debug!(module = %descriptor.name, "Created module replaces unloaded entity");
        }
        self.loaded.put(descriptor);
        self.touch(&before)
    }

    /// Returns `None` when the module was not known.
    pub fn apply_removed(&mut self, name: &str) -> Option<ModuleSetDelta> {
        let before = self.partition();
        let was_loaded = self.loaded.remove(name).is_some();
        let was_unloaded = self.unloaded.remove(name).is_some();
        if !was_loaded && !was_unloaded {
            return None;
        }
        debug!(module = %name, was_unloaded, "Module removed");
        Some(self.touch(&before))
    }

    /// Renames a module in whichever tier holds it. Returns `None` when `old_name` is unknown.
    pub fn apply_renamed(&mut self, old_name: &str, new_name: &str) -> Option<ModuleSetDelta> {
        if old_name == new_name || !self.knows(old_name) {
            return None;
        }
        let before = self.partition();
        if self.loaded.contains(old_name) {
            if self.unloaded.remove(new_name).is_some() {
                info!(old_name, new_name, "Discarding unloaded entity replaced by rename");
            }
            self.loaded.rename(old_name, new_name);
        } else if self.loaded.contains(new_name) {
            warn!(old_name, new_name, "Unloaded module renamed onto a loaded one, discarding it");
            self.unloaded.remove(old_name);
        } else {
            self.unloaded.rename(old_name, new_name);
        }
        Some(self.touch(&before))
    }
}

/// How persisted tiers are reconciled with the names the configuration declares today.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestorePlan {
    pub activated: bool,
    /// Modules whose descriptors are read and loaded.
    pub to_read: BTreeSet<String>,
    pub entities: Vec<UnloadedModuleEntity>,
    /// Modules present in neither tier; placed by discovery.
    pub new_names: BTreeSet<String>,
    /// Persisted names the configuration no longer declares.
    pub dropped: BTreeSet<String>,
}

impl RestorePlan {
    pub fn new(persisted: &PersistedProject, known: &BTreeSet<String>) -> Self {
        let doc = &persisted.loaded;
        let mut dropped: BTreeSet<String> = doc
            .loaded_modules
            .iter()
            .filter(|name| !known.contains(*name))
            .cloned()
            .collect();

        let mut entities = Vec::new();
        for entity in &persisted.unloaded {
            if !known.contains(&entity.name) {
                dropped.insert(entity.name.clone());
            } else if !doc.loaded_modules.contains(&entity.name) {
                entities.push(entity.clone());
            }
        }
        let entity_names: BTreeSet<String> = entities.iter().map(|e| e.name.clone()).collect();

        let activated = doc.activated;
        let (to_read, new_names) = if activated {
            let to_read: BTreeSet<String> =
                known.intersection(&doc.loaded_modules).cloned().collect();
            let new_names = known
                .iter()
                .filter(|name| !to_read.contains(*name) && !entity_names.contains(*name))
                .cloned()
                .collect();
            (to_read, new_names)
        } else {
            (known.difference(&entity_names).cloned().collect(), BTreeSet::new())
        };

        Self {
            activated,
            to_read,
            entities,
            new_names,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn state_ab() -> UnloadState {
        UnloadState::new([
            ModuleDescriptor::new("a").with_content_root("file:///a"),
            ModuleDescriptor::new("b"),
        ])
    }

    #[test]
    fn test_full_replace_moves_modules_between_tiers() {
        let mut state = state_ab();
        assert!(!state.is_activated());

        let delta = state.apply_full_replace(&names(&["a"]), Vec::new());
        assert!(state.is_activated());
        assert_eq!(state.generation(), 1);
        assert_eq!(delta.newly_unloaded, names(&["a"]));
        assert_eq!(state.partition().loaded, names(&["b"]));

        let snapshot = state.snapshot();
        let entity = snapshot.unloaded_entity("a").unwrap();
        assert_eq!(entity.content_root_urls, vec!["file:///a".to_string()]);

        // back to inert
        let delta = state.apply_full_replace(&BTreeSet::new(), Vec::new());
        assert!(!state.is_activated());
        assert_eq!(delta.newly_loaded, names(&["a"]));
        let restored = state.loaded.get("a").unwrap();
        assert_eq!(restored.content_root_urls, vec!["file:///a".to_string()]);
    }

    #[test]
    fn test_rename_unloaded_module_keeps_contents() {
        let mut state = UnloadState::new([
            ModuleDescriptor::new("a")
                .with_content_root("file:///a")
                .with_module_dependency("b"),
            ModuleDescriptor::new("b"),
        ]);
        state.apply_full_replace(&names(&["a"]), Vec::new());

        state.apply_renamed("a", "c").unwrap();
        let snapshot = state.snapshot();
        assert!(snapshot.unloaded_entity("a").is_none());
        let entity = snapshot.unloaded_entity("c").unwrap();
        assert_eq!(entity.content_root_urls, vec!["file:///a".to_string()]);
        assert_eq!(entity.dependency_module_names(), vec!["b".to_string()]);
    }

    #[test]
    fn test_rename_loaded_module_onto_unloaded_name() {
        let mut state = UnloadState::new([ModuleDescriptor::new("a"), ModuleDescriptor::new("b")]);
        state.apply_full_replace(&names(&["a"]), Vec::new());

        let delta = state.apply_renamed("b", "a").unwrap();
        let partition = state.partition();
        assert_eq!(partition.loaded, names(&["a"]));
        assert!(partition.unloaded.is_empty());
        assert_eq!(delta.newly_loaded, names(&["a"]));
        assert_eq!(delta.dropped, names(&["b"]));
        assert!(state.is_activated());
        assert_eq!(state.snapshot().loaded_modules(), names(&["a"]));
    }

    #[test]
    fn test_emptied_unloaded_tier_stays_activated() {
        let mut state = state_ab();
        state.apply_full_replace(&names(&["a"]), Vec::new());
        state.apply_removed("a").unwrap();
        assert!(state.is_activated());
        assert_eq!(state.persisted().loaded.loaded_modules, names(&["b"]));

        state.apply_full_replace(&names(&["b"]), Vec::new());
        state.apply_created_directly(ModuleDescriptor::new("b"));
        assert!(state.is_activated());
    }

    #[test]
    fn test_restored_activation_does_not_depend_on_entities() {
        let state = UnloadState::restored(true, [ModuleDescriptor::new("b")], Vec::new());
        assert!(state.is_activated());
        assert_eq!(state.snapshot().loaded_modules(), names(&["b"]));
    }

    #[test]
    fn test_rename_unloaded_onto_loaded_name_keeps_loaded() {
        let mut state = UnloadState::new([
            ModuleDescriptor::new("a"),
            ModuleDescriptor::new("b"),
            ModuleDescriptor::new("c"),
        ]);
        state.apply_full_replace(&names(&["a"]), Vec::new());
        state.apply_renamed("a", "b").unwrap();
        assert_eq!(state.partition().loaded, names(&["b", "c"]));
        assert!(state.partition().unloaded.is_empty());
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        let mut state = state_ab();
        assert!(state.apply_removed("zzz").is_none());
        assert!(state.apply_renamed("zzz", "y").is_none());
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn test_created_directly_discards_entity() {
        let mut state = state_ab();
        state.apply_full_replace(&names(&["a"]), Vec::new());
        state.apply_created_directly(ModuleDescriptor::new("a"));
        assert_eq!(state.partition().loaded, names(&["a", "b"]));
        assert!(state.snapshot().unloaded_entities.is_empty());
    }

    #[test]
    fn test_restore_plan_reconciles_with_configuration() {
        let persisted = PersistedProject {
            loaded: LoadedModulesDocument {
                activated: true,
                loaded_modules: names(&["b", "gone"]),
            },
            unloaded: vec![
                UnloadedModuleEntity::from(ModuleDescriptor::new("a")),
                UnloadedModuleEntity::from(ModuleDescriptor::new("deleted")),
            ],
        };
        let plan = RestorePlan::new(&persisted, &names(&["a", "b", "fresh"]));
        assert!(plan.activated);
        assert_eq!(plan.to_read, names(&["b"]));
        assert_eq!(plan.entities.len(), 1);
        assert_eq!(plan.new_names, names(&["fresh"]));
        assert_eq!(plan.dropped, names(&["deleted", "gone"]));
    }

    #[test]
    fn test_restore_plan_keeps_activation_without_entities() {
        let persisted = PersistedProject {
            loaded: LoadedModulesDocument {
                activated: true,
                loaded_modules: names(&["b"]),
            },
            unloaded: Vec::new(),
        };
        let plan = RestorePlan::new(&persisted, &names(&["b", "d"]));
        assert!(plan.activated);
        assert_eq!(plan.to_read, names(&["b"]));
        assert_eq!(plan.new_names, names(&["d"]));
    }

    #[test]
    fn test_restore_plan_for_inert_project_loads_everything() {
        let plan = RestorePlan::new(&PersistedProject::default(), &names(&["a", "b"]));
        assert!(!plan.activated);
        assert_eq!(plan.to_read, names(&["a", "b"]));
        assert!(plan.new_names.is_empty());
    }
}
