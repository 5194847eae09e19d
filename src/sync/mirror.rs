//! Local mirror of a server collection
//!
//! Entries are kept newest first. A capped mirror (recent transactions)
//! drops entries past its limit.

use crate::domain::Entity;

/// Length of "most recent" views
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct Mirror<T: Entity> {
    entries: Vec<T>,
    cap: Option<usize>,
}

impl<T: Entity> Default for Mirror<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Mirror<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cap: None,
        }
    }

    /// Mirror that keeps at most `cap` entries
    pub fn capped(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap: Some(cap),
        }
    }

    /// Replace everything with a snapshot already ordered newest first
    pub fn replace(&mut self, snapshot: Vec<T>) {
        self.entries = snapshot;
        self.enforce_cap();
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Insert at the front; false if the id is already present
    pub fn prepend(&mut self, entry: T) -> bool {
        if self.contains(entry.id()) {
            return false;
        }
        self.entries.insert(0, entry);
        self.enforce_cap();
        true
    }

    /// Replace the entry with the same id in place; false if absent
    pub fn replace_entry(&mut self, entry: T) -> bool {
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let index = self.entries.iter().position(|e| e.id() == id)?;
        Some(self.entries.remove(index))
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.entries.iter().map(Entity::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn enforce_cap(&mut self) {
        if let Some(cap) = self.cap {
            self.entries.truncate(cap);
        }
    }
}
