//! Undo/redo history over whole-document snapshots.

use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded past/future snapshot stacks.
///
/// `past` and `future` never share an entry: a fresh `record` clears
/// `future`, so redo is only possible until the next edit.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    capacity: usize,
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<T> HistoryBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            past: VecDeque::with_capacity(capacity),
            future: Vec::new(),
            capacity,
        }
    }

    /// Pushes a pre-edit snapshot. Overflow evicts the oldest entry.
    pub fn record(&mut self, snapshot: T) {
        self.future.clear();
        self.past.push_back(snapshot);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }

    /// Steps back. `current` moves onto the future stack.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Steps forward. `current` moves onto the past stack.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut history: HistoryBuffer<u32> = HistoryBuffer::default();
        assert_eq!(history.undo(5), None);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_undo_then_redo_walks_snapshots() {
        let mut history = HistoryBuffer::with_capacity(10);
        history.record(1);
        history.record(2);
        // current is 3
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.undo(2), Some(1));
        assert!(!history.can_undo());
        assert_eq!(history.redo(1), Some(2));
        assert_eq!(history.redo(2), Some(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = HistoryBuffer::with_capacity(10);
        history.record(1);
        assert_eq!(history.undo(2), Some(1));
        assert!(history.can_redo());
        history.record(1);
        assert!(!history.can_redo());
        assert_eq!(history.redo(9), None);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut history = HistoryBuffer::with_capacity(3);
        for n in 1..=5 {
            history.record(n);
        }
        assert_eq!(history.undo_len(), 3);
        assert_eq!(history.undo(6), Some(5));
        assert_eq!(history.undo(5), Some(4));
        assert_eq!(history.undo(4), Some(3));
        assert_eq!(history.undo(3), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = HistoryBuffer::with_capacity(0);
        history.record("a");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.undo("b"), Some("a"));
    }

    #[test]
    fn test_redo_respects_capacity() {
        let mut history = HistoryBuffer::with_capacity(2);
        history.record(1);
        history.record(2);
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.redo(2), Some(3));
        assert_eq!(history.undo_len(), 2);
    }
}
