//! Pending queue: FIFO of job ids awaiting dispatch plus the paused set.
//!
//! Paused ids stay where they are in the FIFO and are skipped by
//! [`PendingQueue::pop_next_eligible`], so the relative order of everything
//! else is untouched. Resuming moves an id to the tail.

use std::collections::{BTreeSet, VecDeque};

use crate::job::JobId;

#[derive(Debug, Default)]
pub struct PendingQueue {
    order: VecDeque<JobId>,
    paused: BTreeSet<JobId>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` to the tail.
    pub fn enqueue(&mut self, id: JobId) {
        self.order.push_back(id);
    }

    /// Removes and returns the first id that is not paused.
    pub fn pop_next_eligible(&mut self) -> Option<JobId> {
        let index = self.order.iter().position(|id| !self.paused.contains(id))?;
        self.order.remove(index)
    }

    /// Adds `id` to the paused set. Returns false if it was already there.
    pub fn pause(&mut self, id: JobId) -> bool {
        self.paused.insert(id)
    }

    /// Takes `id` out of the paused set and re-appends it at the tail
    /// (its old slot, if any, is dropped). Returns false if it was not paused.
    pub fn resume(&mut self, id: JobId) -> bool {
        if !self.paused.remove(&id) {
            return false;
        }
        self.order.retain(|queued| *queued != id);
        self.order.push_back(id);
        true
    }

    /// Paused ids in ascending order.
    pub fn paused_ids(&self) -> Vec<JobId> {
        self.paused.iter().copied().collect()
    }

    /// 1-based position of `id` among the dispatch-eligible entries.
    pub fn position(&self, id: JobId) -> Option<usize> {
        if self.paused.contains(&id) {
            return None;
        }
        self.order
            .iter()
            .filter(|queued| !self.paused.contains(queued))
            .position(|queued| *queued == id)
            .map(|i| i + 1)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.order.contains(&id)
    }

    /// Number of dispatch-eligible entries.
    pub fn eligible_len(&self) -> usize {
        self.order
            .iter()
            .filter(|id| !self.paused.contains(id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(q: &mut PendingQueue) -> Vec<JobId> {
        std::iter::from_fn(|| q.pop_next_eligible()).collect()
    }

    #[test]
    fn fifo_order() {
        let mut q = PendingQueue::new();
        for id in 1..=4 {
            q.enqueue(id);
        }
        assert_eq!(drain(&mut q), vec![1, 2, 3, 4]);
        assert_eq!(q.pop_next_eligible(), None);
    }

    #[test]
    fn paused_entries_are_skipped_without_reordering_others() {
        let mut q = PendingQueue::new();
        for id in 1..=5 {
            q.enqueue(id);
        }
        q.pause(1);
        q.pause(3);
        assert_eq!(q.pop_next_eligible(), Some(2));
        assert_eq!(q.pop_next_eligible(), Some(4));
        assert_eq!(q.pop_next_eligible(), Some(5));
        assert_eq!(q.pop_next_eligible(), None);
        assert!(q.contains(1) && q.contains(3));
    }

    #[test]
    fn resume_moves_to_tail() {
        let mut q = PendingQueue::new();
        for id in 1..=3 {
            q.enqueue(id);
        }
        assert!(q.pause(1));
        assert!(!q.pause(1));
        assert!(q.resume(1));
        assert!(!q.resume(1));
        assert_eq!(drain(&mut q), vec![2, 3, 1]);
    }

    #[test]
    fn resume_of_id_not_in_order_appends_it() {
        let mut q = PendingQueue::new();
        q.enqueue(2);
        q.pause(1);
        assert!(q.resume(1));
        assert_eq!(drain(&mut q), vec![2, 1]);
    }

    #[test]
    fn positions_ignore_paused_entries() {
        let mut q = PendingQueue::new();
        for id in 1..=3 {
            q.enqueue(id);
        }
        q.pause(2);
        assert_eq!(q.position(1), Some(1));
        assert_eq!(q.position(2), None);
        assert_eq!(q.position(3), Some(2));
        assert_eq!(q.position(9), None);
        assert_eq!(q.eligible_len(), 2);
        assert_eq!(q.paused_ids(), vec![2]);
    }
}
