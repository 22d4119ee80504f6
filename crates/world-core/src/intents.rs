//! Per-tick intent inbox: one slot per entity, last valid submission wins.

use std::collections::BTreeMap;

use contracts::{Intent, RejectReason};

/// The intent inbox for the tick currently accepting submissions. The
/// scheduler opens it at tick start and closes it when the deadline fires;
/// entities without a slot at close act as `Wait`.
#[derive(Debug, Clone, Default)]
pub struct IntentQueue {
    tick_id: u64,
    deadline_ms: u64,
    open: bool,
    slots: BTreeMap<String, Intent>,
}

impl IntentQueue {
    pub fn open_tick(&mut self, tick_id: u64, deadline_ms: u64) {
        self.tick_id = tick_id;
        self.deadline_ms = deadline_ms;
        self.open = true;
        self.slots.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Accepts an intent for `(tick_id, entity_id)`. A mismatched tick is
    /// `wrong_tick`; the right tick after its deadline is `late_tick`.
    /// Resubmission replaces the earlier slot.
    pub fn submit(
        &mut self,
        entity_id: &str,
        tick_id: u64,
        intent: Intent,
        now_ms: u64,
    ) -> Result<(), RejectReason> {
        if tick_id != self.tick_id {
            return Err(RejectReason::WrongTick);
        }
        if !self.open || now_ms > self.deadline_ms {
            return Err(RejectReason::LateTick);
        }
        self.slots.insert(entity_id.to_string(), intent);
        Ok(())
    }

    /// Hands the collected intents to resolution and resets the slots.
    pub fn drain(&mut self) -> BTreeMap<String, Intent> {
        self.open = false;
        std::mem::take(&mut self.slots)
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Direction;

    fn move_east() -> Intent {
        Intent::Move {
            direction: Direction::East,
        }
    }

    #[test]
    fn wrong_tick_takes_precedence_over_lateness() {
        let mut queue = IntentQueue::default();
        queue.open_tick(7, 1_500);
        assert_eq!(
            queue.submit("a", 6, move_east(), 9_000),
            Err(RejectReason::WrongTick)
        );
    }

    #[test]
    fn submission_past_the_deadline_is_late() {
        let mut queue = IntentQueue::default();
        queue.open_tick(7, 1_500);
        assert_eq!(
            queue.submit("a", 7, move_east(), 1_501),
            Err(RejectReason::LateTick)
        );
        assert!(queue.submit("a", 7, move_east(), 1_500).is_ok());
    }

    #[test]
    fn closed_queue_rejects_the_current_tick_as_late() {
        let mut queue = IntentQueue::default();
        queue.open_tick(7, 1_500);
        queue.close();
        assert_eq!(
            queue.submit("a", 7, move_east(), 1_000),
            Err(RejectReason::LateTick)
        );
    }

    #[test]
    fn resubmission_replaces_the_previous_intent() {
        let mut queue = IntentQueue::default();
        queue.open_tick(3, 500);
        queue.submit("a", 3, move_east(), 100).expect("first");
        queue
            .submit("a", 3, Intent::Wait, 200)
            .expect("replacement");
        let drained = queue.drain();
        assert_eq!(drained.get("a"), Some(&Intent::Wait));
        assert_eq!(drained.len(), 1);
    }

    #[test]
    fn drain_closes_and_clears_the_slots() {
        let mut queue = IntentQueue::default();
        queue.open_tick(3, 500);
        queue.submit("a", 3, move_east(), 100).expect("accepted");
        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(!queue.is_open());
        assert_eq!(queue.pending(), 0);
    }
}
