use std::collections::{BTreeSet, HashMap};

use super::StoredEntity;

/// An arena of values indexed by name.
///
/// Removed slots are recycled through a free list, so a store that sees a lot of
/// load/unload churn does not grow without bound.
#[derive(Debug, Clone)]
pub struct KeyedStore<T: StoredEntity> {
    slots: Vec<Option<T>>,
    index: HashMap<String, usize>,
    free: Vec<usize>,
}

impl<T: StoredEntity> Default for KeyedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StoredEntity> KeyedStore<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
        }
    }

    /// Inserts `value`, returning the previous value stored under the same name.
    pub fn put(&mut self, value: T) -> Option<T> {
        if let Some(&slot) = self.index.get(value.name()) {
            return self.slots[slot].replace(value);
        }
        let name = value.name().to_owned();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        };
        self.index.insert(name, slot);
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        let slot = self.index.remove(name)?;
        let value = self.slots[slot].take();
        self.free.push(slot);
        value
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index
            .get(name)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Moves the value stored under `old_name` to `new_name`, keeping every other field.
    ///
    /// A value already stored under `new_name` is replaced. Returns `false` when there is
    /// nothing under `old_name`.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        if old_name == new_name {
            return self.contains(old_name);
        }
        let Some(mut value) = self.remove(old_name) else {
            return false;
        };
        value.set_name(new_name.to_owned());
        self.put(value);
        true
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Clones every value, sorted by name.
    pub fn all_entities(&self) -> Vec<T> {
        let mut values: Vec<T> = self.iter().cloned().collect();
        values.sort_by(|a, b| a.name().cmp(b.name()));
        values
    }
}
