//! Handle-pair queues filled by each step's dispatch.
//!
//! Four ordered queues, one per [`EventKind`]. A pair lands in a queue
//! once both bodies' hooks for that transition have run. Queues are
//! cleared when the next step starts, so polling between steps is
//! non-destructive and always sees the most recent step's transitions.

use torque_core::{EventKind, HandlePair};

/// The four handle-pair queues for one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQueues {
    collision_entered: Vec<HandlePair>,
    collision_exited: Vec<HandlePair>,
    trigger_entered: Vec<HandlePair>,
    trigger_exited: Vec<HandlePair>,
}

impl EventQueues {
    /// Empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_mut(&mut self, kind: EventKind) -> &mut Vec<HandlePair> {
        match kind {
            EventKind::CollisionEnter => &mut self.collision_entered,
            EventKind::CollisionExit => &mut self.collision_exited,
            EventKind::TriggerEnter => &mut self.trigger_entered,
            EventKind::TriggerExit => &mut self.trigger_exited,
        }
    }

    /// Pairs of `kind` from the last step, in dispatch order.
    pub fn get(&self, kind: EventKind) -> &[HandlePair] {
        match kind {
            EventKind::CollisionEnter => &self.collision_entered,
            EventKind::CollisionExit => &self.collision_exited,
            EventKind::TriggerEnter => &self.trigger_entered,
            EventKind::TriggerExit => &self.trigger_exited,
        }
    }

    /// Append one pair.
    pub fn push(&mut self, kind: EventKind, pair: HandlePair) {
        self.queue_mut(kind).push(pair);
    }

    /// Number of pairs of `kind`.
    pub fn len(&self, kind: EventKind) -> usize {
        self.get(kind).len()
    }

    /// `true` if every queue is empty.
    pub fn is_empty(&self) -> bool {
        EventKind::ALL.iter().all(|&k| self.get(k).is_empty())
    }

    /// Pairs across all four queues.
    pub fn total(&self) -> usize {
        EventKind::ALL.iter().map(|&k| self.len(k)).sum()
    }

    /// `true` if a pair of `kind` involves `body`.
    pub fn involves(&self, kind: EventKind, body: torque_core::BodyHandle) -> bool {
        self.get(kind).iter().any(|p| p.contains(body))
    }

    /// Empty every queue, keeping capacity.
    pub fn clear(&mut self) {
        for kind in EventKind::ALL {
            self.queue_mut(kind).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torque_core::BodyHandle;

    fn pair(a: u32, b: u32) -> HandlePair {
        HandlePair::new(BodyHandle(a), BodyHandle(b))
    }

    #[test]
    fn queues_are_independent_and_ordered() {
        let mut q = EventQueues::new();
        q.push(EventKind::CollisionEnter, pair(1, 2));
        q.push(EventKind::CollisionEnter, pair(3, 4));
        q.push(EventKind::TriggerExit, pair(5, 6));
        assert_eq!(q.get(EventKind::CollisionEnter), &[pair(1, 2), pair(3, 4)]);
        assert!(q.get(EventKind::CollisionExit).is_empty());
        assert_eq!(q.total(), 3);
        assert!(q.involves(EventKind::TriggerExit, BodyHandle(6)));
        assert!(!q.involves(EventKind::TriggerEnter, BodyHandle(6)));
    }

    #[test]
    fn reading_does_not_consume() {
        let mut q = EventQueues::new();
        q.push(EventKind::TriggerEnter, pair(1, 2));
        let first = q.get(EventKind::TriggerEnter).to_vec();
        let second = q.get(EventKind::TriggerEnter).to_vec();
        assert_eq!(first, second);
        q.clear();
        assert!(q.is_empty());
    }
}
