//! # Reachability Engine
//!
//! Computes which modules stay loaded. Both invocation modes are the same forward closure
//! over module dependency edges, seeded from a set of roots and allowed to enter only
//! *admissible* modules:
//!
//! - **Full replace** ([`full_replace`]): roots are every known module not explicitly
//!   requested unloaded; admissible targets are known, non-requested modules.
//! - **Discovery** ([`place_discovered`]): roots are the currently loaded modules;
//!   admissible targets are the newly discovered modules only. A discovered module joins
//!   the loaded set only when a chain of loaded modules leads to it.
//!
//! Edges to names that are not admissible are dead ends. That covers unresolved names,
//! explicitly unloaded modules and already unloaded modules alike, so the closure never
//! walks *through* an unloaded module. The closure terminates on cycles.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::model::{ModuleDescriptor, ModulePartition, UnloadedModuleEntity};

/// Module-to-module edges keyed by source module name.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a ModuleDescriptor>,
    ) -> Self {
        let mut graph = Self::new();
        for descriptor in descriptors {
            graph.insert(descriptor);
        }
        graph
    }

    pub fn insert(&mut self, descriptor: &ModuleDescriptor) {
        self.insert_edges(
            descriptor.name.clone(),
            descriptor.module_dependency_names().map(str::to_owned),
        );
    }

    pub fn insert_entity(&mut self, entity: &UnloadedModuleEntity) {
        self.insert_edges(entity.name.clone(), entity.dependency_module_names());
    }

    /// Replaces the outgoing edges of `module`.
    pub fn insert_edges(&mut self, module: String, targets: impl IntoIterator<Item = String>) {
        self.edges.insert(module, targets.into_iter().collect());
    }

    pub fn dependencies_of(&self, module: &str) -> &[String] {
        self.edges.get(module).map_or(&[], Vec::as_slice)
    }
}

/// Forward closure from `roots`, entering only modules accepted by `admissible`.
///
/// Roots are always part of the result. Since every visited module is inserted before its
/// edges are followed, this is the fixpoint of "add any admissible target of a reached
/// module" and handles chains and cycles among admissible modules.
pub fn closure<'a>(
    graph: &DependencyGraph,
    roots: impl IntoIterator<Item = &'a str>,
    admissible: impl Fn(&str) -> bool,
) -> BTreeSet<String> {
    let mut reached = BTreeSet::new();
    let mut queue: VecDeque<&str> = roots.into_iter().collect();
    while let Some(module) = queue.pop_front() {
        if !reached.insert(module.to_owned()) {
            continue;
        }
        for target in graph.dependencies_of(module) {
            if !reached.contains(target.as_str()) && admissible(target) {
                queue.push_back(target);
            }
        }
    }
    reached
}

/// Full-replace mode, triggered by an explicit unload request.
///
/// `requested` names that are not in `known` are ignored. A requested module is never
/// pulled back into the loaded set, even when a loaded module depends on it.
pub fn full_replace(
    known: &BTreeSet<String>,
    graph: &DependencyGraph,
    requested: &BTreeSet<String>,
) -> ModulePartition {
    let roots = known
        .iter()
        .filter(|name| !requested.contains(*name))
        .map(String::as_str);
    let loaded = closure(graph, roots, |target| {
        known.contains(target) && !requested.contains(target)
    });
    let unloaded = known.difference(&loaded).cloned().collect();
    ModulePartition { loaded, unloaded }
}

/// Discovery mode: places newly discovered modules relative to the current loaded set.
///
/// `graph` must carry the edges of the loaded modules and of the discovered ones. The
/// returned partition covers `discovered` only; modules already known keep their place.
pub fn place_discovered(
    graph: &DependencyGraph,
    loaded: &BTreeSet<String>,
    discovered: &BTreeSet<String>,
) -> ModulePartition {
    let reached = closure(graph, loaded.iter().map(String::as_str), |target| {
        discovered.contains(target)
    });
    let newly_loaded: BTreeSet<String> = discovered
        .iter()
        .filter(|name| reached.contains(*name))
        .cloned()
        .collect();
    let newly_unloaded = discovered.difference(&newly_loaded).cloned().collect();
    ModulePartition {
        loaded: newly_loaded,
        unloaded: newly_unloaded,
    }
}
