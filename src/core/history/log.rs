//! Bounded in-memory history of completed batches.

use super::types::UndoBatch;
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded LIFO of batches; the oldest batch is evicted when full
#[derive(Debug, Clone)]
pub struct UndoLog {
    /// Oldest first
    batches: VecDeque<UndoBatch>,
    capacity: usize,
}

impl UndoLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            batches: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Record a batch, evicting the oldest ones over capacity
    pub fn push(&mut self, batch: UndoBatch) {
        self.batches.push_back(batch);
        while self.batches.len() > self.capacity {
            if let Some(evicted) = self.batches.pop_front() {
                debug!(batch = %evicted.id, "Evicted oldest batch from undo history");
            }
        }
    }

    pub fn peek_latest(&self) -> Option<&UndoBatch> {
        self.batches.back()
    }

    pub fn get(&self, id: &str) -> Option<&UndoBatch> {
        self.batches.iter().find(|b| b.id == id)
    }

    /// Remove and return the batch with `id`
    pub fn pop(&mut self, id: &str) -> Option<UndoBatch> {
        let position = self.batches.iter().position(|b| b.id == id)?;
        self.batches.remove(position)
    }

    /// Newest first
    pub fn batches(&self) -> Vec<UndoBatch> {
        self.batches.iter().rev().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: &str) -> UndoBatch {
        UndoBatch::with_id(id, Vec::new())
    }

    #[test]
    fn eleven_pushes_keep_ten_newest() {
        let mut log = UndoLog::default();
        for i in 0..11 {
            log.push(batch(&format!("b{}", i)));
        }
        assert_eq!(log.len(), 10);
        assert!(log.get("b0").is_none());
        assert_eq!(log.peek_latest().unwrap().id, "b10");
        assert_eq!(log.batches().last().unwrap().id, "b1");
    }

    #[test]
    fn pop_removes_by_id() {
        let mut log = UndoLog::new(3);
        log.push(batch("a"));
        log.push(batch("b"));

        assert_eq!(log.pop("a").unwrap().id, "a");
        assert!(log.pop("a").is_none());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn batches_are_newest_first() {
        let mut log = UndoLog::new(5);
        log.push(batch("old"));
        log.push(batch("new"));
        let ids: Vec<_> = log.batches().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["new", "old"]);

        log.clear();
        assert!(log.is_empty());
    }
}
