//! Round-robin rotation over a fixed set of items (HTTP clients bound to proxies)

use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free round-robin selector
#[derive(Debug)]
pub struct RoundRobin<T> {
    items: Vec<T>,
    cursor: AtomicUsize,
}

impl<T> RoundRobin<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Next item in rotation, or `None` when empty
    pub fn next(&self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.items.len();
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
