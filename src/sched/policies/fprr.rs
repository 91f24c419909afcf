/*
 * Fixed-Priority Round-Robin Policy
 *
 * The reference policy: 32 priority levels, each a FIFO queue of thread
 * ids. Priority 1 is the highest, 32 the lowest. `schedule` scans from
 * the highest level and rotates the winner to the tail of its queue, so
 * threads sharing a level round-robin among themselves. No aging, no
 * starvation protection; those belong to other policies.
 */

use alloc::collections::VecDeque;

use crate::error::SchedResult;
use crate::sched::policies::Policy;
use crate::sched::thread::ThdDesc;
use crate::sched::types::{Priority, SchedParam, Tid};
use crate::time::Cycles;

/// Number of priority levels.
pub const NUM_PRIOS: usize = 32;

/// Highest (most urgent) priority.
pub const PRIO_HIGHEST: Priority = Priority(1);

/// Lowest priority; the default for freshly registered threads.
pub const PRIO_LOWEST: Priority = Priority(NUM_PRIOS as u32);

pub struct Fprr {
    /// FIFO run queue per priority level, highest first.
    queues: [VecDeque<Tid>; NUM_PRIOS],
}

impl Fprr {
    pub fn new() -> Self {
        Fprr {
            queues: core::array::from_fn(|_| VecDeque::new()),
        }
    }

    fn level(prio: Priority) -> usize {
        assert!(
            prio >= PRIO_HIGHEST && prio <= PRIO_LOWEST,
            "priority {:?} out of range",
            prio
        );
        (prio.0 - 1) as usize
    }

    fn queue_of(&mut self, t: &ThdDesc) -> &mut VecDeque<Tid> {
        &mut self.queues[Self::level(t.priority)]
    }

    fn remove(&mut self, tid: Tid) {
        for q in self.queues.iter_mut() {
            q.retain(|&queued| queued != tid);
        }
    }

    fn is_queued(&self, tid: Tid) -> bool {
        self.queues.iter().any(|q| q.contains(&tid))
    }
}

impl Default for Fprr {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Fprr {
    fn thd_init(&mut self, t: &mut ThdDesc) {
        t.priority = PRIO_LOWEST;
    }

    fn thd_deinit(&mut self, t: &mut ThdDesc) {
        self.remove(t.tid);
    }

    fn thd_modify(&mut self, t: &mut ThdDesc, param: SchedParam, value: u32) -> SchedResult<()> {
        match param {
            SchedParam::Priority => {
                let prio = Priority(value);
                let _ = Self::level(prio); // range check
                if prio == t.priority {
                    // Re-queueing here would perturb FIFO order for no
                    // observable change.
                    return Ok(());
                }
                let was_queued = self.is_queued(t.tid);
                self.remove(t.tid);
                t.priority = prio;
                if was_queued {
                    self.queue_of(t).push_back(t.tid);
                }
                log::debug!("fprr: {} now at priority {}", t.tid, value);
                Ok(())
            }
        }
    }

    fn block(&mut self, t: &mut ThdDesc) {
        self.remove(t.tid);
    }

    fn wakeup(&mut self, t: &mut ThdDesc) {
        debug_assert!(!self.is_queued(t.tid), "{} woken while queued", t.tid);
        let tid = t.tid;
        self.queue_of(t).push_back(tid);
    }

    fn yield_to(&mut self, t: &mut ThdDesc, _yield_to: Option<Tid>) {
        // Rotate to the tail of its level.
        let tid = t.tid;
        let q = self.queue_of(t);
        q.retain(|&queued| queued != tid);
        q.push_back(tid);
    }

    fn schedule(&mut self) -> Option<Tid> {
        for q in self.queues.iter_mut() {
            if let Some(tid) = q.pop_front() {
                // Move the winner to the back so the level stays truly
                // round-robin.
                q.push_back(tid);
                return Some(tid);
            }
        }
        None
    }

    fn execution(&mut self, _t: &mut ThdDesc, _cycles: Cycles) {}

    fn name(&self) -> &'static str {
        "fprr"
    }

    #[cfg(test)]
    fn queued_count(&self, tid: Tid) -> usize {
        self.queues
            .iter()
            .map(|q| q.iter().filter(|&&queued| queued == tid).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::thread::{ThdCaps, ThdProperty, ThdState};
    use crate::sched::types::CapId;

    fn desc(tid: u32) -> ThdDesc {
        let mut t = ThdDesc::new(
            ThdCaps::bare(Tid(tid), CapId(tid as u64)),
            ThdProperty::empty(),
            ThdState::Runnable,
        );
        t.priority = PRIO_LOWEST;
        t
    }

    fn queued(p: &mut Fprr, t: &mut ThdDesc, prio: u32) {
        p.thd_init(t);
        p.thd_modify(t, SchedParam::Priority, prio).unwrap();
        p.wakeup(t);
    }

    #[test]
    fn schedule_prefers_higher_priority() {
        let mut p = Fprr::new();
        let mut lo = desc(1);
        let mut hi = desc(2);
        queued(&mut p, &mut lo, 20);
        queued(&mut p, &mut hi, 2);

        assert_eq!(p.schedule(), Some(Tid(2)));
        p.block(&mut hi);
        assert_eq!(p.schedule(), Some(Tid(1)));
    }

    #[test]
    fn schedule_rotates_within_a_level() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        let mut b = desc(2);
        queued(&mut p, &mut a, 5);
        queued(&mut p, &mut b, 5);

        // FIFO among equals, and the winner goes to the back.
        assert_eq!(p.schedule(), Some(Tid(1)));
        assert_eq!(p.schedule(), Some(Tid(2)));
        assert_eq!(p.schedule(), Some(Tid(1)));
    }

    #[test]
    fn schedule_empty_returns_none() {
        let mut p = Fprr::new();
        assert_eq!(p.schedule(), None);
    }

    #[test]
    fn block_removes_membership() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        queued(&mut p, &mut a, 5);
        assert_eq!(p.queued_count(Tid(1)), 1);

        p.block(&mut a);
        assert_eq!(p.queued_count(Tid(1)), 0);
        assert_eq!(p.schedule(), None);

        p.wakeup(&mut a);
        assert_eq!(p.queued_count(Tid(1)), 1);
    }

    #[test]
    fn yield_rotates_to_tail() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        let mut b = desc(2);
        queued(&mut p, &mut a, 5);
        queued(&mut p, &mut b, 5);

        p.yield_to(&mut a, None);
        assert_eq!(p.schedule(), Some(Tid(2)));
    }

    #[test]
    fn modify_moves_between_levels() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        let mut b = desc(2);
        queued(&mut p, &mut a, 5);
        queued(&mut p, &mut b, 5);

        p.thd_modify(&mut b, SchedParam::Priority, 3).unwrap();
        assert_eq!(b.priority, Priority(3));
        assert_eq!(p.schedule(), Some(Tid(2)));
        assert_eq!(p.queued_count(Tid(2)), 1);
    }

    #[test]
    fn modify_same_priority_is_a_noop() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        let mut b = desc(2);
        queued(&mut p, &mut a, 5);
        queued(&mut p, &mut b, 5);

        // Re-setting the head's priority must not rotate it behind b.
        p.thd_modify(&mut a, SchedParam::Priority, 5).unwrap();
        assert_eq!(p.schedule(), Some(Tid(1)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn priority_zero_is_rejected() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        p.thd_init(&mut a);
        let _ = p.thd_modify(&mut a, SchedParam::Priority, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn priority_above_lowest_is_rejected() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        p.thd_init(&mut a);
        let _ = p.thd_modify(&mut a, SchedParam::Priority, 33);
    }

    #[test]
    fn default_priority_is_lowest() {
        let mut p = Fprr::new();
        let mut a = desc(1);
        a.priority = Priority(7);
        p.thd_init(&mut a);
        assert_eq!(a.priority, PRIO_LOWEST);
    }
}
