//! Fixed-length FIFO queue with drop-oldest overflow.
//!
//! Used to hold cycle-accurate frames rendered ahead of the audio callback:
//! - Pushing into a full fifo bumps the oldest value, never the newest.
//! - Popping an empty fifo returns `None`.
//! - Insertion order equals production order.
//! - Clearing keeps the allocated capacity.
//!
//! The backing storage is allocated once at construction; pushes never
//! reallocate, so the audio-producing path stays allocation-free.

use std::collections::VecDeque;

/// Fixed-capacity FIFO queue
#[derive(Debug, Clone)]
pub struct Fifo<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Fifo<T> {
    /// Create an empty fifo with the given capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; a zero-length fifo is a programmer
    /// error, not a runtime condition.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "fifo capacity must be positive");
        Fifo {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an item, bumping the oldest one out if the fifo is full
    pub fn push(&mut self, value: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(value);
        debug_assert!(self.items.len() <= self.capacity);
    }

    /// Pop the oldest item, or `None` if the fifo is empty
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Read-only reference to the oldest item
    pub fn first(&self) -> Option<&T> {
        self.items.front()
    }

    /// Read-only reference to the newest item
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        let num_items = self.items.len();
        debug_assert!(num_items <= self.capacity);
        num_items
    }

    /// Check whether the fifo holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The fixed capacity chosen at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all queued items, keeping the allocated capacity
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
