#![allow(clippy::len_without_is_empty)]

/// A bounded FIFO buffer backed by a fixed-size ring
///
/// Once `capacity` elements are held, every push overwrites the oldest element.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Append an element, evicting the oldest if the buffer is full
    pub fn push(&mut self, item: T) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
        } else {
            self.buffer[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// View the elements in storage order, for uses where ordering is irrelevant
    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    /// Iterate over the elements in FIFO order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (older, newer) = self.buffer.split_at(self.head);
        newer.iter().chain(older.iter())
    }
}
