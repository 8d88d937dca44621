use std::collections::BTreeSet;

/// The project-wide split of known modules into loaded and unloaded names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePartition {
    pub loaded: BTreeSet<String>,
    pub unloaded: BTreeSet<String>,
}

impl ModulePartition {
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    pub fn is_unloaded(&self, name: &str) -> bool {
        self.unloaded.contains(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.is_loaded(name) || self.is_unloaded(name)
    }

    /// Every module name, loaded or not.
    pub fn all_known(&self) -> BTreeSet<String> {
        self.loaded.union(&self.unloaded).cloned().collect()
    }

    /// `true` when no name is both loaded and unloaded.
    pub fn is_disjoint(&self) -> bool {
        self.loaded.is_disjoint(&self.unloaded)
    }
}

/// What a single mutation did to the partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSetDelta {
    /// Names that are loaded now and were not loaded before.
    pub newly_loaded: BTreeSet<String>,
    /// Names that are unloaded now and were not unloaded before.
    pub newly_unloaded: BTreeSet<String>,
    /// Names that are no longer known at all.
    pub dropped: BTreeSet<String>,
}

impl ModuleSetDelta {
    pub fn between(before: &ModulePartition, after: &ModulePartition) -> Self {
        let known_after = after.all_known();
        Self {
            newly_loaded: after.loaded.difference(&before.loaded).cloned().collect(),
            newly_unloaded: after.unloaded.difference(&before.unloaded).cloned().collect(),
            dropped: before
                .all_known()
                .into_iter()
                .filter(|name| !known_after.contains(name))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.newly_loaded.is_empty() && self.newly_unloaded.is_empty() && self.dropped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delta_between_partitions() {
        let before = ModulePartition {
            loaded: names(&["a", "b"]),
            unloaded: names(&["c"]),
        };
        let after = ModulePartition {
            loaded: names(&["b", "c"]),
            unloaded: names(&["d"]),
        };
        let delta = ModuleSetDelta::between(&before, &after);
        assert_eq!(delta.newly_loaded, names(&["c"]));
        assert_eq!(delta.newly_unloaded, names(&["d"]));
        assert_eq!(delta.dropped, names(&["a"]));
        assert!(ModuleSetDelta::between(&after, &after).is_empty());
    }
}
