//! Pending records, kept in write order.
//!
//! The buffer is not synchronized on its own. [`crate::writer::RotatingWriter`]
//! only touches it under the coordinator lock.

use std::collections::BinaryHeap;

use crate::record::Record;

#[derive(Debug, Default)]
pub struct OrderedBuffer {
    heap: BinaryHeap<Record>,
}

impl OrderedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, record: Record) {
        self.heap.push(record);
    }

    /// Remove every buffered record, returned in ascending `(timestamp, content)` order.
    pub fn drain_all(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.heap).into_sorted_vec()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
