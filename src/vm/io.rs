//! VM input channel
//!
//! Pending input values consumed strictly first-in first-out by the input
//! operation. Output has no queue: each produced value is handed back to the
//! caller through the pause returned by `VM::run`.

use std::collections::VecDeque;

use crate::vm::errors::VMError;

/// FIFO queue feeding the input operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputChannel {
    pending: VecDeque<i64>,
}

impl InputChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to the tail of the queue
    pub fn push(&mut self, value: i64) {
        self.pending.push_back(value);
    }

    /// Remove and return the head of the queue
    pub fn pop(&mut self) -> Result<i64, VMError> {
        self.pending.pop_front().ok_or(VMError::EmptyInput)
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<i64> for InputChannel {
    fn extend<T: IntoIterator<Item = i64>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}

impl FromIterator<i64> for InputChannel {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}
