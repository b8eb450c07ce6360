//! Bounded, newest-first list of updates.

use crate::record::TrafficUpdate;

/// Most updates the feed keeps in memory.
pub const FEED_CAPACITY: usize = 50;

/// Newest-first list holding at most `capacity` updates with unique ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentUpdates {
    items: Vec<TrafficUpdate>,
    capacity: usize,
}

impl RecentUpdates {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Replaces the contents with an already ordered batch.
    ///
    /// Later duplicates of an id are skipped and the batch is cut to capacity.
    pub fn replace(&mut self, updates: Vec<TrafficUpdate>) {
        self.items.clear();
        for update in updates {
            if self.items.len() == self.capacity {
                break;
            }
            if !self.contains(&update.id) {
                self.items.push(update);
            }
        }
    }

    /// Puts `update` at the front and returns the update evicted from the tail.
    ///
    /// An update already present under the same id is moved to the front with
    /// the new content instead of being duplicated.
    pub fn prepend(&mut self, update: TrafficUpdate) -> Option<TrafficUpdate> {
        self.items.retain(|existing| existing.id != update.id);
        self.items.insert(0, update);

        if self.items.len() > self.capacity {
            self.items.pop()
        } else {
            None
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|update| update.id == id)
    }

    pub fn as_slice(&self) -> &[TrafficUpdate] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrafficUpdate> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentUpdates {
    fn default() -> Self {
        Self::new()
    }
}
