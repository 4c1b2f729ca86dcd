//! Handle registry
//!
//! Wrappers live in a [`SlotMap`] keyed by typed ids; a side index maps each
//! native handle to the single wrapper representing it. Removed ids resolve
//! to nothing, even once their slot is reused.

use std::collections::HashMap;
use std::hash::Hash;

use slotmap::{Key, SlotMap};

/// Wrappers keyed by native handle `H`, addressed by slotmap id `I`
pub struct Registry<H, I: Key, T> {
    entries: SlotMap<I, (H, T)>,
    by_handle: HashMap<H, I>,
}

impl<H, I: Key, T> Default for Registry<H, I, T> {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
            by_handle: HashMap::new(),
        }
    }
}

impl<H, I, T> Registry<H, I, T>
where
    H: Copy + Eq + Hash,
    I: Key,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the wrapper for `handle`, creating it with `make` if none exists.
    ///
    /// Returns the id and whether a new wrapper was inserted.
    pub fn get_or_insert_with(&mut self, handle: H, make: impl FnOnce() -> T) -> (I, bool) {
        if let Some(id) = self.by_handle.get(&handle) {
            return (*id, false);
        }
        let id = self.entries.insert((handle, make()));
        self.by_handle.insert(handle, id);
        (id, true)
    }

    /// Id of the wrapper currently representing `handle`
    pub fn lookup(&self, handle: H) -> Option<I> {
        self.by_handle.get(&handle).copied()
    }

    pub fn contains(&self, id: I) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.entries.get(id).map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.entries.get_mut(id).map(|(_, value)| value)
    }

    /// Native handle the wrapper was registered for
    pub fn handle(&self, id: I) -> Option<H> {
        self.entries.get(id).map(|(handle, _)| *handle)
    }

    /// Remove a wrapper, invalidating every outstanding copy of its id
    pub fn remove(&mut self, id: I) -> Option<T> {
        let (handle, value) = self.entries.remove(id)?;
        self.by_handle.remove(&handle);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.entries.iter().map(|(id, (_, value))| (id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.entries.iter_mut().map(|(id, (_, value))| (id, value))
    }

    pub fn ids(&self) -> Vec<I> {
        self.entries.keys().collect()
    }

    /// Remove every wrapper
    pub fn clear(&mut self) {
        self.by_handle.clear();
        self.entries.clear();
    }
}
