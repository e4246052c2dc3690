use std::{cmp::Ordering, collections::BinaryHeap, time::Instant};

/// A queue of items that become available once a given instant has passed.
/// Items due at the same instant come out in the order they were added.
#[derive(Clone)]
pub struct TimeQueue<T> {
    queue: BinaryHeap<ItemContainer<T>>,
    next_index: u64,
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_index: 0,
        }
    }

    /// Adds an item that becomes available at `instant`
    pub fn add_item(&mut self, instant: Instant, item: T) {
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);
        self.queue.push(ItemContainer {
            instant,
            index,
            item,
        });
    }

    /// Returns whether an item is due at `now`
    pub fn has_item(&self, now: &Instant) -> bool {
        match self.queue.peek() {
            Some(container) => container.instant <= *now,
            None => false,
        }
    }

    /// Removes and returns the earliest item, if it is due at `now`
    pub fn pop_item(&mut self, now: &Instant) -> Option<T> {
        if self.has_item(now) {
            return self.queue.pop().map(|container| container.item);
        }
        None
    }

    /// Instant at which the earliest item becomes available
    pub fn next_instant(&self) -> Option<Instant> {
        self.queue.peek().map(|container| container.instant)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct ItemContainer<T> {
    instant: Instant,
    index: u64,
    item: T,
}

// BinaryHeap is a max-heap, so the ordering is reversed: earliest instant,
// then lowest insertion index, is the greatest element.
impl<T> Ord for ItemContainer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .instant
            .cmp(&self.instant)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl<T> PartialOrd for ItemContainer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for ItemContainer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant && self.index == other.index
    }
}

impl<T> Eq for ItemContainer<T> {}
