//! Bounded FIFO of recent strength samples for the scrolling trace.

use std::collections::VecDeque;

/// Fixed-capacity strength history; pushing past capacity evicts the oldest
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest-first copy for handing to the renderer
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }
}
